use serde::{Deserialize, Serialize};

/// Actuator commands produced for one simulation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarControl {
    /// Throttle in `[0, 1]`.
    pub accel: f64,
    /// Brake in `[0, 1]`.
    pub brake: f64,
    /// `-1` reverse, `0` neutral, `1..=6` forward gears.
    pub gear: i32,
    /// Steering in `[-1, 1]`; positive turns left.
    pub steer: f64,
    /// Clutch in `[0, 1]`.
    pub clutch: f64,
    /// Requested focus direction in degrees.
    pub focus: i32,
    /// Ask the simulator to restart the race.
    pub restart: bool,
}

impl CarControl {
    /// Splits a single accel/brake command around 0.5.
    ///
    /// Above 0.5 the car accelerates with `(v - 0.5) * 2`, otherwise it brakes
    /// with `1 - v * 2`. Throttle and brake are never applied together.
    #[must_use]
    pub fn from_accel_brake(accel_brake: f64, gear: i32, steer: f64) -> Self {
        let (accel, brake) = if accel_brake > 0.5 {
            ((accel_brake - 0.5) * 2.0, 0.0)
        } else {
            (0.0, 1.0 - accel_brake * 2.0)
        };
        Self {
            accel,
            brake,
            gear,
            steer: steer.clamp(-1.0, 1.0),
            ..Self::default()
        }
    }
}
