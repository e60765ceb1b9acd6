//! Read-only sensor snapshot consumed by the control modules.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

pub const FOCUS_SENSORS: usize = 5;
pub const OPPONENT_SENSORS: usize = 36;
pub const TRACK_SENSORS: usize = 19;
pub const WHEELS: usize = 4;

/// Distance reported by an opponent sensor that sees nothing.
pub const NO_OPPONENT: f64 = 200.0;

const WHEEL_RADIUS: f64 = 0.3325;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum StateError {
    #[display("{sensor} has {actual} readings, expected {expected}")]
    SensorCount {
        sensor: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// One simulation step worth of sensor readings.
///
/// Angles are in radians, distances in metres, speeds in km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CarStateRecord", into = "CarStateRecord")]
pub struct CarState {
    /// Angle between the car heading and the track axis.
    pub angle: f64,
    pub cur_lap_time: f64,
    pub damage: f64,
    pub dist_from_start: f64,
    /// Distance covered since the start of the race.
    pub dist_raced: f64,
    pub focus: [f64; FOCUS_SENSORS],
    pub fuel: f64,
    /// `-1` is reverse, `0` neutral.
    pub gear: i32,
    pub last_lap_time: f64,
    /// Closest opponent per 10° sector, clockwise from behind.
    pub opponents: [f64; OPPONENT_SENSORS],
    pub race_pos: u32,
    pub rpm: f64,
    pub speed_x: f64,
    pub speed_y: f64,
    pub speed_z: f64,
    /// Rangefinders at -90°..=90° in 10° steps; index 9 looks straight ahead.
    pub track: [f64; TRACK_SENSORS],
    /// 0 on the track axis, ±1 on the edges, beyond ±1 off the track.
    pub track_pos: f64,
    /// Angular speed of each wheel (rad/s).
    pub wheel_spin_vel: [f64; WHEELS],
    pub z: f64,
}

impl Default for CarState {
    fn default() -> Self {
        Self {
            angle: 0.0,
            cur_lap_time: 0.0,
            damage: 0.0,
            dist_from_start: 0.0,
            dist_raced: 0.0,
            focus: [0.0; FOCUS_SENSORS],
            fuel: 0.0,
            gear: 0,
            last_lap_time: 0.0,
            opponents: [NO_OPPONENT; OPPONENT_SENSORS],
            race_pos: 0,
            rpm: 0.0,
            speed_x: 0.0,
            speed_y: 0.0,
            speed_z: 0.0,
            track: [0.0; TRACK_SENSORS],
            track_pos: 0.0,
            wheel_spin_vel: [0.0; WHEELS],
            z: 0.0,
        }
    }
}

impl CarState {
    /// Norm of the velocity vector.
    #[must_use]
    pub fn speed(&self) -> f64 {
        (self.speed_x.powi(2) + self.speed_y.powi(2) + self.speed_z.powi(2)).sqrt()
    }

    /// Ground speed implied by the mean wheel spin.
    ///
    /// Compared against [`Self::speed`] to detect slipping wheels.
    #[must_use]
    pub fn wheels_speed(&self) -> f64 {
        let spin = self.wheel_spin_vel.iter().sum::<f64>() / 4.0;
        spin * WHEEL_RADIUS * 4.0 * PI * PI
    }
}

/// Wire shape of [`CarState`] with variable-length sensor arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CarStateRecord {
    angle: f64,
    cur_lap_time: f64,
    damage: f64,
    dist_from_start: f64,
    dist_raced: f64,
    focus: Vec<f64>,
    fuel: f64,
    gear: i32,
    last_lap_time: f64,
    opponents: Vec<f64>,
    race_pos: u32,
    rpm: f64,
    speed_x: f64,
    speed_y: f64,
    speed_z: f64,
    track: Vec<f64>,
    track_pos: f64,
    wheel_spin_vel: Vec<f64>,
    z: f64,
}

fn sensor_array<const N: usize>(
    sensor: &'static str,
    values: Vec<f64>,
) -> Result<[f64; N], StateError> {
    let actual = values.len();
    values.try_into().map_err(|_| StateError::SensorCount {
        sensor,
        expected: N,
        actual,
    })
}

impl TryFrom<CarStateRecord> for CarState {
    type Error = StateError;

    fn try_from(record: CarStateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            angle: record.angle,
            cur_lap_time: record.cur_lap_time,
            damage: record.damage,
            dist_from_start: record.dist_from_start,
            dist_raced: record.dist_raced,
            focus: sensor_array("focus", record.focus)?,
            fuel: record.fuel,
            gear: record.gear,
            last_lap_time: record.last_lap_time,
            opponents: sensor_array("opponents", record.opponents)?,
            race_pos: record.race_pos,
            rpm: record.rpm,
            speed_x: record.speed_x,
            speed_y: record.speed_y,
            speed_z: record.speed_z,
            track: sensor_array("track", record.track)?,
            track_pos: record.track_pos,
            wheel_spin_vel: sensor_array("wheel_spin_vel", record.wheel_spin_vel)?,
            z: record.z,
        })
    }
}

impl From<CarState> for CarStateRecord {
    fn from(state: CarState) -> Self {
        Self {
            angle: state.angle,
            cur_lap_time: state.cur_lap_time,
            damage: state.damage,
            dist_from_start: state.dist_from_start,
            dist_raced: state.dist_raced,
            focus: state.focus.to_vec(),
            fuel: state.fuel,
            gear: state.gear,
            last_lap_time: state.last_lap_time,
            opponents: state.opponents.to_vec(),
            race_pos: state.race_pos,
            rpm: state.rpm,
            speed_x: state.speed_x,
            speed_y: state.speed_y,
            speed_z: state.speed_z,
            track: state.track.to_vec(),
            track_pos: state.track_pos,
            wheel_spin_vel: state.wheel_spin_vel.to_vec(),
            z: state.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_is_velocity_norm() {
        let state = CarState {
            speed_x: 3.0,
            speed_y: 4.0,
            speed_z: 12.0,
            ..CarState::default()
        };
        assert!((state.speed() - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_wheels_speed_uses_mean_spin() {
        let state = CarState {
            wheel_spin_vel: [1.0, 1.0, 3.0, 3.0],
            ..CarState::default()
        };
        let expected = 2.0 * WHEEL_RADIUS * 4.0 * PI * PI;
        assert!((state.wheels_speed() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let state = CarState {
            angle: 0.1,
            gear: 3,
            rpm: 5400.0,
            track: [50.0; TRACK_SENSORS],
            ..CarState::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let parsed: CarState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_wrong_sensor_count_is_rejected() {
        let json = r#"{
            "focus": [0, 0, 0, 0, 0],
            "opponents": [],
            "track": [],
            "wheel_spin_vel": [0, 0, 0, 0]
        }"#;
        let err = serde_json::from_str::<CarState>(json).unwrap_err();
        assert!(err.to_string().contains("opponents has 0 readings"), "{err}");
    }
}
