//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (CAPRA_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$CAPRA_SW_ROOT/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_capra_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    // Load the file into a string
    let params_str = read_to_string(path)
        .map_err(LoadError::FileLoadError)?;

    // Parse the string into the parameter struct
    toml::from_str(params_str.as_str())
        .map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestParams {
        broker_port: u16,
        name: String
    }

    #[test]
    fn test_load_from() {
        let path = std::env::temp_dir().join("util_params_test_load_from.toml");
        std::fs::write(&path, "broker_port = 1883\nname = \"capra\"\n").unwrap();

        let params: TestParams = load_from(&path).unwrap();
        assert_eq!(params, TestParams { broker_port: 1883, name: "capra".into() });

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<TestParams, _> = load_from("/this/path/does/not/exist.toml");
        assert!(matches!(result, Err(LoadError::FileLoadError(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let path = std::env::temp_dir().join("util_params_test_load_invalid.toml");
        std::fs::write(&path, "broker_port = \"not a number\"\n").unwrap();

        let result: Result<TestParams, _> = load_from(&path);
        assert!(matches!(result, Err(LoadError::DeserialiseError(_))));

        std::fs::remove_file(&path).ok();
    }
}
