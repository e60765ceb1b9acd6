use racetune_model::tunable::{ParameterError, Tunable};

use crate::state::CarState;

/// Opponent sensor pointing straight ahead.
const FRONT: usize = 18;
/// Speed (km/h) above which a close opponent triggers braking.
const BRAKE_SPEED: f64 = 70.0;
const BRAKE_STEP: f64 = 0.5;

const TOLERANCE_MAX: f64 = 20.0;
const INCREMENT_MAX: f64 = 0.3;

/// Braking and steering corrections around nearby opponents.
///
/// Parameter layout:
///
/// | index  | meaning                                               |
/// |--------|-------------------------------------------------------|
/// | 0..5   | brake tolerance for sensors at ±40°, ±30°, ±20°, ±10°, 0° |
/// | 5..11  | overtake tolerance for > 50°, ±50°, ±40°, ±30°, ±20°, < 20° |
/// | 11..17 | steering increment for the same overtake sectors      |
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentsModule {
    brake_tolerance: [f64; 5],
    overtake_tolerance: [f64; 6],
    overtake_increment: [f64; 6],
}

impl Default for OpponentsModule {
    fn default() -> Self {
        Self {
            brake_tolerance: [6.0, 6.5, 7.0, 7.5, 8.0],
            overtake_tolerance: [10.0, 12.0, 14.0, 16.0, 18.0, 20.0],
            overtake_increment: [0.10, 0.12, 0.14, 0.16, 0.18, 0.20],
        }
    }
}

/// Brake tolerance slot of a sensor `offset` sectors away from the front.
fn brake_slot(offset: usize) -> usize {
    4 - offset
}

/// Overtake slot of a sensor `offset` sectors away from the front.
fn overtake_slot(offset: usize) -> usize {
    if offset > 5 { 0 } else { (6 - offset).min(5) }
}

impl OpponentsModule {
    /// Whether any opponent within ±40° of the front is closer than its
    /// brake tolerance.
    #[must_use]
    pub fn violates_security_distance(&self, state: &CarState) -> bool {
        state.opponents[FRONT - 4..=FRONT + 4]
            .iter()
            .enumerate()
            .any(|(k, &distance)| distance < self.brake_tolerance[brake_slot(k.abs_diff(4))])
    }

    /// Adjusts the steering and accel/brake commands for nearby opponents.
    ///
    /// Returns the corrected `(steer, accel_brake)`.
    #[must_use]
    pub fn adjust(&self, state: &CarState, steer: f64, accel_brake: f64) -> (f64, f64) {
        let mut accel_brake = accel_brake;
        if state.speed() > BRAKE_SPEED && self.violates_security_distance(state) {
            accel_brake = (accel_brake - BRAKE_STEP).max(0.0);
        }

        let mut steer = steer;
        for (k, &distance) in state.opponents[FRONT - 10..=FRONT + 10].iter().enumerate() {
            let slot = overtake_slot(k.abs_diff(10));
            if distance < self.overtake_tolerance[slot] {
                // steer away from the side the opponent is on
                if k < 10 {
                    steer += self.overtake_increment[slot];
                } else {
                    steer -= self.overtake_increment[slot];
                }
            }
        }
        (steer, accel_brake)
    }
}

impl Tunable for OpponentsModule {
    fn parameter_count(&self) -> usize {
        17
    }

    fn lower_bounds(&self) -> Vec<f64> {
        vec![0.0; 17]
    }

    fn upper_bounds(&self) -> Vec<f64> {
        let mut upper = vec![TOLERANCE_MAX; 11];
        upper.extend([INCREMENT_MAX; 6]);
        upper
    }

    fn parameters(&self) -> Vec<f64> {
        self.brake_tolerance
            .iter()
            .chain(&self.overtake_tolerance)
            .chain(&self.overtake_increment)
            .copied()
            .collect()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(self.parameter_count(), parameters.len())?;
        self.brake_tolerance.copy_from_slice(&parameters[..5]);
        self.overtake_tolerance.copy_from_slice(&parameters[5..11]);
        self.overtake_increment.copy_from_slice(&parameters[11..]);
        Ok(())
    }
}
