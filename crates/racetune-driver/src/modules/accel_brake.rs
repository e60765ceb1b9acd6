use racetune_model::tunable::{ParameterError, Tunable};

use crate::state::CarState;

const THRESHOLD_RANGE: (f64, f64) = (1.0, 2.0);

/// Speed tracking with anti-lock filtering.
///
/// Produces a single command in `[0, 1]` where 0 is full brake, 1 full
/// throttle and 0.5 coasting.
#[derive(Debug, Clone, PartialEq)]
pub struct AccelBrakeModule {
    /// Wheel slip (km/h) tolerated before braking is relaxed.
    threshold: f64,
}

impl Default for AccelBrakeModule {
    fn default() -> Self {
        Self { threshold: 1.5 }
    }
}

impl AccelBrakeModule {
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn control(&self, state: &CarState, target_speed: f64) -> f64 {
        if state.gear == -1 {
            return 1.0;
        }
        let speed = state.speed();
        let mut command = 2.0 / (1.0 + (speed - target_speed).exp());
        let slip = speed - state.wheels_speed();
        if slip > self.threshold {
            command -= (slip - self.threshold) / 5.0;
        }
        command / 2.0
    }
}

impl Tunable for AccelBrakeModule {
    fn parameter_count(&self) -> usize {
        1
    }

    fn lower_bounds(&self) -> Vec<f64> {
        vec![THRESHOLD_RANGE.0]
    }

    fn upper_bounds(&self) -> Vec<f64> {
        vec![THRESHOLD_RANGE.1]
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.threshold]
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(1, parameters.len())?;
        self.threshold = parameters[0];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_gear_floors_it() {
        let state = CarState {
            gear: -1,
            speed_x: 80.0,
            ..CarState::default()
        };
        assert_eq!(AccelBrakeModule::default().control(&state, 0.0), 1.0);
    }

    #[test]
    fn test_on_target_speed_coasts() {
        let state = CarState {
            gear: 3,
            speed_x: 100.0,
            wheel_spin_vel: [100.0 / (0.3325 * 4.0 * std::f64::consts::PI.powi(2)); 4],
            ..CarState::default()
        };
        let command = AccelBrakeModule::default().control(&state, 100.0);
        assert!((command - 0.5).abs() < 1e-9, "{command}");
    }

    #[test]
    fn test_slip_reduces_command() {
        let module = AccelBrakeModule::default();
        let gripping = CarState {
            gear: 2,
            speed_x: 50.0,
            wheel_spin_vel: [50.0 / (0.3325 * 4.0 * std::f64::consts::PI.powi(2)); 4],
            ..CarState::default()
        };
        let slipping = CarState {
            wheel_spin_vel: [0.0; 4],
            ..gripping.clone()
        };
        assert!(module.control(&slipping, 10.0) < module.control(&gripping, 10.0));
    }

    #[test]
    fn test_parameters_round_trip() {
        let mut module = AccelBrakeModule::default();
        module.set_parameters(&[1.25]).unwrap();
        assert_eq!(module.parameters(), vec![1.25]);
        assert!(module.set_parameters(&[1.0, 2.0]).is_err());
        assert_eq!(module.threshold(), 1.25);
    }
}
