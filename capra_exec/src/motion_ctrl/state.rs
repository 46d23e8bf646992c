//! Implementations for the MotionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::{net::RobotSession, tc::OperationMode};
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{
    is_transition_allowed,
    CancelToken, Clock, MotionCtrlError, Params, SystemClock,
    TICK_PERIOD_S, ZERO_SPEED_DISTANCE
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion control module state
///
/// The controller does not own the connection to the robot, the [`RobotSession`] is passed in to
/// each operation.
#[derive(Debug)]
pub struct MotionCtrl<C: Clock = SystemClock> {
    params: Params,

    clock: C,

    cancel: CancelToken,

    /// The last mode successfully sent to the robot, `None` until the first mode change.
    mode: Option<OperationMode>
}

/// Summary of a completed drive.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DriveReport {
    /// Number of velocity commands published.
    pub instructions_sent: u64,

    /// Distance covered according to the commanded speed.
    pub distance_covered: f64,

    /// True if the drive was stopped by the cancel token before reaching its target.
    pub cancelled: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionCtrl<SystemClock> {
    pub fn new(params: Params) -> Self {
        Self::with_clock(params, SystemClock)
    }
}

impl<C: Clock> MotionCtrl<C> {
    /// Create a controller which waits between ticks using the given clock.
    pub fn with_clock(params: Params, clock: C) -> Self {
        Self {
            params,
            clock,
            cancel: CancelToken::new(),
            mode: None
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A handle which cancels the drive in progress.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The last mode sent to the robot.
    pub fn mode(&self) -> Option<OperationMode> {
        self.mode
    }

    /// Request a new operation mode.
    ///
    /// Transitions not in the transition table are rejected without anything being published. The
    /// recorded mode only changes once the mode command has been published.
    pub fn set_mode(
        &mut self,
        session: &RobotSession,
        mode: OperationMode
    ) -> Result<(), MotionCtrlError> {
        if !is_transition_allowed(self.mode, mode) {
            // Only reachable once a mode is known
            let from = self.mode.unwrap_or(mode);
            warn!("Refusing to change mode from {} to {}", from, mode);
            return Err(MotionCtrlError::IllegalTransition { from, to: mode })
        }

        session
            .send_mode(mode)
            .map_err(MotionCtrlError::SessionError)?;

        self.mode = Some(mode);

        Ok(())
    }

    pub fn stop(&mut self, session: &RobotSession) -> Result<(), MotionCtrlError> {
        self.set_mode(session, OperationMode::Stopped)
    }

    pub fn run(&mut self, session: &RobotSession) -> Result<(), MotionCtrlError> {
        self.set_mode(session, OperationMode::Running)
    }

    pub fn abort(&mut self, session: &RobotSession) -> Result<(), MotionCtrlError> {
        self.set_mode(session, OperationMode::Aborting)
    }

    pub fn pause(&mut self, session: &RobotSession) -> Result<(), MotionCtrlError> {
        self.set_mode(session, OperationMode::Paused)
    }

    /// Drive the given distance by streaming velocity commands.
    ///
    /// One command is published per tick of [`TICK_PERIOD_S`], each tick covering
    /// `|speed| * TICK_PERIOD_S`, until the covered distance reaches `distance`. This publishes
    /// `ceil(distance / step)` commands. A zero speed sends exactly one command whatever the
    /// distance, a distance of zero or less sends none.
    ///
    /// Any pending cancellation is cleared when the drive starts. The cancel token is checked
    /// before each publish, and a cancelled drive returns `Ok` with `cancelled` set. Publish
    /// failures end the drive immediately and are not retried.
    pub fn drive_distance(
        &self,
        session: &RobotSession,
        distance: f64,
        speed: i64,
        angle: f64
    ) -> Result<DriveReport, MotionCtrlError> {
        if !angle.is_finite() {
            return Err(MotionCtrlError::InvalidCommandValue {
                field: "angle",
                value: angle.to_string()
            })
        }

        let (target, step) = if speed == 0 {
            (ZERO_SPEED_DISTANCE, ZERO_SPEED_DISTANCE)
        }
        else {
            if !distance.is_finite() {
                return Err(MotionCtrlError::InvalidCommandValue {
                    field: "distance",
                    value: distance.to_string()
                })
            }
            (distance, (speed as f64).abs() * TICK_PERIOD_S)
        };

        self.cancel.reset();

        info!("Driving {} at speed {} and angle {} rad", target, speed, angle);

        let tick = Duration::from_secs_f64(TICK_PERIOD_S);
        let mut ticks: u64 = 0;
        let mut covered = 0.0;

        while covered < target {
            if self.cancel.is_cancelled() {
                warn!("Drive cancelled after {} of {}", covered, target);
                return Ok(DriveReport {
                    instructions_sent: ticks,
                    distance_covered: covered,
                    cancelled: true
                })
            }

            session
                .send_instruction(speed, angle)
                .map_err(MotionCtrlError::SessionError)?;

            self.clock.sleep(tick);

            // Computed from the tick count so the number of ticks does not depend on accumulated
            // round-off
            ticks += 1;
            covered = step * ticks as f64;

            debug!("Distance covered: {}", covered);
        }

        info!("Drive complete, {} commands sent", ticks);

        Ok(DriveReport {
            instructions_sent: ticks,
            distance_covered: covered,
            cancelled: false
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::net::{PublishError, SessionError, Transport};
    use comms_if::tc::TOPIC_REMOTE;
    use std::sync::{Arc, Mutex};

    type Sent = Arc<Mutex<Vec<(String, String)>>>;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Sent,
        fail_after: Option<usize>
    }

    impl Transport for RecordingTransport {
        fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
            let mut sent = self.sent.lock().unwrap();
            if let Some(n) = self.fail_after {
                if sent.len() >= n {
                    return Err(PublishError::NotConnected)
                }
            }
            sent.push((topic.to_string(), payload.to_string()));
            Ok(())
        }

        fn connected(&self) -> bool {
            true
        }
    }

    /// Clock which records sleeps instead of sleeping, optionally cancelling after some ticks.
    #[derive(Default)]
    struct RecordingClock {
        sleeps: Mutex<Vec<Duration>>,
        cancel_after: Option<(usize, CancelToken)>
    }

    impl Clock for RecordingClock {
        fn sleep(&self, duration: Duration) {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            if let Some((n, ref token)) = self.cancel_after {
                if sleeps.len() >= n {
                    token.cancel();
                }
            }
        }
    }

    fn setup() -> (MotionCtrl<RecordingClock>, RobotSession, Sent) {
        let transport = RecordingTransport::default();
        let sent = transport.sent.clone();
        (
            MotionCtrl::with_clock(Params::default(), RecordingClock::default()),
            RobotSession::with_transport(transport),
            sent
        )
    }

    #[test]
    fn test_drive_publish_count() {
        let (ctrl, session, sent) = setup();

        let report = ctrl.drive_distance(&session, 0.2, 1, 1.2).unwrap();

        assert_eq!(report.instructions_sent, 2);
        assert!(!report.cancelled);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(t, _)| t == TOPIC_REMOTE));
        assert_eq!(
            sent[0].1,
            r#"{"header": {"frame_id": "frame_id"}, "twist": {"linear": {"x": 1}, "angular": {"z": 1.2}}}"#
        );

        let sleeps = ctrl.clock.sleeps.lock().unwrap();
        assert_eq!(*sleeps, vec![Duration::from_millis(100); 2]);
    }

    #[test]
    fn test_drive_zero_speed_sends_once() {
        for distance in [0.0, 0.2, 50.0, -1.0, f64::NAN].iter() {
            let (ctrl, session, sent) = setup();

            let report = ctrl.drive_distance(&session, *distance, 0, 0.0).unwrap();

            assert_eq!(report.instructions_sent, 1);
            assert_eq!(sent.lock().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_drive_rounds_up() {
        // (distance, speed, expected publishes)
        let cases = [(0.25, 1, 3), (0.5, 2, 3), (0.5, -2, 3), (1.0, 1, 10), (0.05, 1, 1)];

        for (distance, speed, expected) in cases.iter() {
            let (ctrl, session, sent) = setup();

            let report = ctrl.drive_distance(&session, *distance, *speed, 0.0).unwrap();

            assert_eq!(report.instructions_sent, *expected, "{} at {}", distance, speed);
            assert_eq!(sent.lock().unwrap().len(), *expected as usize);
            assert!(report.distance_covered >= *distance);
        }
    }

    #[test]
    fn test_drive_non_positive_distance() {
        let (ctrl, session, sent) = setup();

        let report = ctrl.drive_distance(&session, 0.0, 1, 0.0).unwrap();
        assert_eq!(report.instructions_sent, 0);

        ctrl.drive_distance(&session, -3.0, 2, 0.0).unwrap();
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drive_rejects_non_finite() {
        let (ctrl, session, sent) = setup();

        assert!(matches!(
            ctrl.drive_distance(&session, f64::INFINITY, 1, 0.0),
            Err(MotionCtrlError::InvalidCommandValue { field: "distance", .. })
        ));
        assert!(matches!(
            ctrl.drive_distance(&session, 1.0, 1, f64::NAN),
            Err(MotionCtrlError::InvalidCommandValue { field: "angle", .. })
        ));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drive_cancel() {
        let transport = RecordingTransport::default();
        let sent = transport.sent.clone();
        let session = RobotSession::with_transport(transport);

        let token = CancelToken::new();
        let clock = RecordingClock {
            cancel_after: Some((3, token.clone())),
            ..Default::default()
        };
        let mut ctrl = MotionCtrl::with_clock(Params::default(), clock);
        ctrl.cancel = token;

        let report = ctrl.drive_distance(&session, 10.0, 1, 0.0).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.instructions_sent, 3);
        assert_eq!(sent.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_drive_clears_stale_cancel() {
        let (ctrl, session, _) = setup();

        ctrl.cancel_token().cancel();
        let report = ctrl.drive_distance(&session, 0.2, 1, 0.0).unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.instructions_sent, 2);
    }

    #[test]
    fn test_drive_publish_failure_stops() {
        let transport = RecordingTransport {
            fail_after: Some(2),
            ..Default::default()
        };
        let sent = transport.sent.clone();
        let session = RobotSession::with_transport(transport);
        let ctrl = MotionCtrl::with_clock(Params::default(), RecordingClock::default());

        let result = ctrl.drive_distance(&session, 1.0, 1, 0.0);

        assert!(matches!(
            result,
            Err(MotionCtrlError::SessionError(SessionError::PublishFailure(_)))
        ));
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_set_mode() {
        let (mut ctrl, session, sent) = setup();

        assert_eq!(ctrl.mode(), None);

        ctrl.run(&session).unwrap();
        ctrl.pause(&session).unwrap();
        ctrl.stop(&session).unwrap();

        assert_eq!(ctrl.mode(), Some(OperationMode::Stopped));

        let payloads: Vec<String> = sent.lock().unwrap().iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(
            payloads,
            vec![
                r#"{"operation_mode": 2}"#,
                r#"{"operation_mode": 5}"#,
                r#"{"operation_mode": 1}"#
            ]
        );
    }

    #[test]
    fn test_illegal_transition_not_published() {
        let (mut ctrl, session, sent) = setup();

        ctrl.abort(&session).unwrap();
        assert_eq!(sent.lock().unwrap().len(), 1);

        let result = ctrl.run(&session);

        assert!(matches!(
            result,
            Err(MotionCtrlError::IllegalTransition {
                from: OperationMode::Aborting,
                to: OperationMode::Running
            })
        ));
        assert_eq!(sent.lock().unwrap().len(), 1);
        assert_eq!(ctrl.mode(), Some(OperationMode::Aborting));

        ctrl.set_mode(&session, OperationMode::Aborted).unwrap();
        ctrl.stop(&session).unwrap();
        assert_eq!(ctrl.mode(), Some(OperationMode::Stopped));
    }

    #[test]
    fn test_failed_mode_publish_keeps_mode() {
        let transport = RecordingTransport {
            fail_after: Some(1),
            ..Default::default()
        };
        let session = RobotSession::with_transport(transport);
        let mut ctrl = MotionCtrl::with_clock(Params::default(), RecordingClock::default());

        ctrl.run(&session).unwrap();
        assert!(ctrl.pause(&session).is_err());
        assert_eq!(ctrl.mode(), Some(OperationMode::Running));
    }
}
