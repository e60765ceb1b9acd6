use racetune_model::{
    activation::Activation,
    network::{FeedForwardNetwork, NetworkError},
    tunable::{ParameterError, Tunable},
};

use crate::state::CarState;

/// Rangefinder pointing straight ahead.
const FRONT: usize = 9;
/// Rangefinders on each side of the front one fed to the network.
const SPREAD: usize = 3;
const INPUTS: usize = 2 * SPREAD + 1;
const HIDDEN: usize = 7;
/// Maximum rangefinder reading (m).
const SENSOR_RANGE: f64 = 200.0;

const STRAIGHT_DISTANCE: f64 = 100.0;
const STRAIGHT_SPEED: f64 = 300.0;

const MIN_SPEED_RANGE: (f64, f64) = (0.0, 70.0);
const MAX_SPEED_RANGE: (f64, f64) = (100.0, 350.0);

/// Half-width of the weight search box.
///
/// A uniform draw on `±weight_limit()` has the standard deviation of the
/// Gaussian initialization for `fan_in + fan_out = 14`.
fn weight_limit() -> f64 {
    (6.0_f64 / (14.0 * 14.0)).sqrt()
}

/// Desired speed from a small network over the seven central rangefinders.
///
/// The network output in `[0, 1]` is mapped onto `[min_speed, max_speed]`;
/// both ends of that range are tuned along with the weights, which come first
/// in the parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpeedModule {
    network: FeedForwardNetwork,
    min_speed: f64,
    max_speed: f64,
}

impl TargetSpeedModule {
    pub fn new() -> Result<Self, NetworkError> {
        let network = FeedForwardNetwork::new(INPUTS, true)?
            .with_layer(HIDDEN, Activation::Tanh)?
            .with_layer(HIDDEN, Activation::Tanh)?
            .with_layer(1, Activation::ClippedShift)?;
        Ok(Self {
            network,
            min_speed: 40.0,
            max_speed: 200.0,
        })
    }

    #[must_use]
    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    #[must_use]
    pub fn speed_range(&self) -> (f64, f64) {
        (self.min_speed, self.max_speed)
    }

    /// Target speed in km/h.
    pub fn control(&mut self, state: &CarState) -> f64 {
        if state.track[FRONT] >= STRAIGHT_DISTANCE {
            return STRAIGHT_SPEED;
        }
        let sensors = &state.track[FRONT - SPREAD..=FRONT + SPREAD];
        for (input, distance) in self.network.input_mut().iter_mut().zip(sensors) {
            *input = distance / SENSOR_RANGE;
        }
        self.network.forward();
        let output = self.network.output()[0];
        output * (self.max_speed - self.min_speed) + self.min_speed
    }
}

impl Tunable for TargetSpeedModule {
    fn parameter_count(&self) -> usize {
        self.network.parameter_count() + 2
    }

    fn lower_bounds(&self) -> Vec<f64> {
        let mut lower = vec![-weight_limit(); self.network.parameter_count()];
        lower.extend([MIN_SPEED_RANGE.0, MAX_SPEED_RANGE.0]);
        lower
    }

    fn upper_bounds(&self) -> Vec<f64> {
        let mut upper = vec![weight_limit(); self.network.parameter_count()];
        upper.extend([MIN_SPEED_RANGE.1, MAX_SPEED_RANGE.1]);
        upper
    }

    fn parameters(&self) -> Vec<f64> {
        let mut parameters = self.network.weights();
        parameters.extend([self.min_speed, self.max_speed]);
        parameters
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(self.parameter_count(), parameters.len())?;
        let (weights, speeds) = parameters.split_at(parameters.len() - 2);
        self.network.set_weights(weights)?;
        self.min_speed = speeds[0];
        self.max_speed = speeds[1];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let module = TargetSpeedModule::new().unwrap();
        assert_eq!(module.network().parameter_count(), 120);
        assert_eq!(module.parameter_count(), 122);
        let bounds = module.bounds().unwrap();
        assert_eq!(bounds.lower()[120], 0.0);
        assert_eq!(bounds.upper()[121], 350.0);
        assert!((bounds.upper()[0] - 0.174_963).abs() < 1e-6);
    }

    #[test]
    fn test_long_straight_forces_top_speed() {
        let mut module = TargetSpeedModule::new().unwrap();
        let mut state = CarState::default();
        state.track[FRONT] = 150.0;
        assert_eq!(module.control(&state), STRAIGHT_SPEED);
    }

    #[test]
    fn test_zero_network_targets_mid_range() {
        let mut module = TargetSpeedModule::new().unwrap();
        let mut parameters = vec![0.0; 120];
        parameters.extend([20.0, 220.0]);
        module.set_parameters(&parameters).unwrap();

        let mut state = CarState::default();
        state.track[FRONT] = 50.0;
        // clamp(0 + 0.5) maps to the middle of [20, 220]
        assert!((module.control(&state) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_parameters_round_trip() {
        let mut module = TargetSpeedModule::new().unwrap();
        let parameters = (0..122).map(|i| f64::from(i) / 1000.0).collect::<Vec<_>>();
        module.set_parameters(&parameters).unwrap();
        assert_eq!(module.parameters(), parameters);
        assert_eq!(module.speed_range(), (0.120, 0.121));
        assert!(module.set_parameters(&parameters[1..]).is_err());
    }
}
