//! Parameters structure for MotionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::MotionCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for motion control.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    /// Limits on drive requests accepted from an operator.
    #[serde(default)]
    pub limits: DriveLimits
}

/// Accepted ranges of the values of a drive request, all bounds inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct DriveLimits {
    // ---- SPEED ----

    pub min_speed: i64,
    pub max_speed: i64,

    // ---- ANGLE ----

    /// Units: radians
    pub min_angle_rad: f64,

    /// Units: radians
    pub max_angle_rad: f64,

    // ---- DISTANCE ----

    /// Units: robot travel units, one unit per second at speed 1
    pub min_distance: f64,

    /// Units: robot travel units, one unit per second at speed 1
    pub max_distance: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveLimits {
    fn default() -> Self {
        Self {
            min_speed: -2,
            max_speed: 2,
            min_angle_rad: -0.8,
            max_angle_rad: 1.5,
            min_distance: 0.1,
            max_distance: 100.0
        }
    }
}

impl DriveLimits {
    /// Check a drive request against the limits.
    ///
    /// NaN values are never within the limits.
    pub fn check(&self, distance: f64, speed: i64, angle: f64) -> Result<(), MotionCtrlError> {
        if speed < self.min_speed || speed > self.max_speed {
            return Err(invalid("speed", speed))
        }

        if !(self.min_angle_rad..=self.max_angle_rad).contains(&angle) {
            return Err(invalid("angle", angle))
        }

        if !(self.min_distance..=self.max_distance).contains(&distance) {
            return Err(invalid("distance", distance))
        }

        Ok(())
    }
}

fn invalid<T: ToString>(field: &'static str, value: T) -> MotionCtrlError {
    MotionCtrlError::InvalidCommandValue {
        field,
        value: value.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = DriveLimits::default();

        assert!(limits.check(0.1, -2, -0.8).is_ok());
        assert!(limits.check(100.0, 2, 1.5).is_ok());
        assert!(limits.check(5.0, 0, 0.0).is_ok());
    }

    #[test]
    fn test_out_of_limits() {
        let limits = DriveLimits::default();

        let field = |r: Result<(), MotionCtrlError>| match r {
            Err(MotionCtrlError::InvalidCommandValue { field, .. }) => field,
            other => panic!("Expected InvalidCommandValue, got {:?}", other)
        };

        assert_eq!(field(limits.check(1.0, 3, 0.0)), "speed");
        assert_eq!(field(limits.check(1.0, -3, 0.0)), "speed");
        assert_eq!(field(limits.check(1.0, 1, 1.6)), "angle");
        assert_eq!(field(limits.check(1.0, 1, f64::NAN)), "angle");
        assert_eq!(field(limits.check(0.05, 1, 0.0)), "distance");
        assert_eq!(field(limits.check(100.5, 1, 0.0)), "distance");
    }

    #[test]
    fn test_params_from_toml() {
        let params: Params = toml::from_str(
            r#"
            [limits]
            min_speed = -1
            max_speed = 1
            min_angle_rad = -0.5
            max_angle_rad = 0.5
            min_distance = 0.5
            max_distance = 10.0
            "#
        ).unwrap();

        assert_eq!(params.limits.max_speed, 1);
        assert!(params.limits.check(1.0, 2, 0.0).is_err());

        let empty: Params = toml::from_str("").unwrap();
        assert_eq!(empty.limits, DriveLimits::default());
    }
}
