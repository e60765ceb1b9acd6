use racetune_model::tunable::{ParameterError, Tunable};

use crate::state::CarState;

/// Rangefinder pointing straight ahead.
const FRONT: usize = 9;
/// Wheel angle (rad) at full steering lock.
const STEER_LOCK: f64 = 0.785_398;
/// Front distance (m) from which the road counts as a long straight.
const STRAIGHT_DISTANCE: f64 = 100.0;
const STRAIGHT_DAMPING: f64 = 0.2;

const WEIGHTS: usize = 9;

/// Steering from a weighted average of the nine front rangefinders
/// (-40°..=40°).
///
/// Weight `k` is bounded to `[0.5k - 2.5, 0.5k - 1.5]` so that sensors on one
/// side pull left and those on the other side pull right.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringModule {
    weights: [f64; WEIGHTS],
}

#[expect(clippy::cast_precision_loss)]
fn weight_range(k: usize) -> (f64, f64) {
    let centre = k as f64 * 0.5 - 2.0;
    (centre - 0.5, centre + 0.5)
}

impl Default for SteeringModule {
    fn default() -> Self {
        Self {
            weights: std::array::from_fn(|k| {
                let (lo, hi) = weight_range(k);
                (lo + hi) / 2.0
            }),
        }
    }
}

impl SteeringModule {
    /// Whether the car is between the track edges.
    #[must_use]
    pub fn is_on_track(state: &CarState) -> bool {
        state.track_pos.abs() <= 1.0
    }

    #[must_use]
    pub fn control(&self, state: &CarState) -> f64 {
        if state.gear == -1 {
            return -state.angle / STEER_LOCK;
        }
        if !Self::is_on_track(state) {
            return (state.angle - state.track_pos * 0.5) / STEER_LOCK;
        }

        let sensors = &state.track[FRONT - 4..=FRONT + 4];
        let norm = sensors.iter().sum::<f64>();
        if norm == 0.0 {
            return 0.0;
        }
        let weighted = sensors
            .iter()
            .zip(&self.weights)
            .map(|(d, w)| d * w)
            .sum::<f64>();
        let damping = if state.track[FRONT] >= STRAIGHT_DISTANCE {
            STRAIGHT_DAMPING
        } else {
            1.0
        };
        weighted * damping / norm
    }
}

impl Tunable for SteeringModule {
    fn parameter_count(&self) -> usize {
        WEIGHTS
    }

    fn lower_bounds(&self) -> Vec<f64> {
        (0..WEIGHTS).map(|k| weight_range(k).0).collect()
    }

    fn upper_bounds(&self) -> Vec<f64> {
        (0..WEIGHTS).map(|k| weight_range(k).1).collect()
    }

    fn parameters(&self) -> Vec<f64> {
        self.weights.to_vec()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(WEIGHTS, parameters.len())?;
        self.weights.copy_from_slice(parameters);
        Ok(())
    }
}
