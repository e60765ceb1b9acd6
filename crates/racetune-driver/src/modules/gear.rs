use std::f64::consts::PI;

use racetune_model::tunable::{ParameterError, Tunable};

use crate::state::CarState;

const FORWARD_GEARS: usize = 6;
const UPSHIFT_RANGE: (f64, f64) = (3000.0, 8000.0);
const DOWNSHIFT_RANGE: (f64, f64) = (1000.0, 4000.0);

/// Heading error beyond which the car counts as misaligned.
const STUCK_ANGLE: f64 = PI / 6.0;
/// Consecutive misaligned steps before reversing out.
const STUCK_STEPS: usize = 25;

/// RPM-threshold gear selection with stuck recovery.
///
/// Parameters are six upshift thresholds followed by six downshift
/// thresholds, both indexed by the current forward gear.
#[derive(Debug, Clone, PartialEq)]
pub struct GearModule {
    upshift: [f64; FORWARD_GEARS],
    downshift: [f64; FORWARD_GEARS],
    misaligned_steps: usize,
    reversing: bool,
}

impl Default for GearModule {
    fn default() -> Self {
        Self {
            upshift: [8000.0; FORWARD_GEARS],
            downshift: [1000.0, 2500.0, 3000.0, 3000.0, 3500.0, 3500.0],
            misaligned_steps: 0,
            reversing: false,
        }
    }
}

impl GearModule {
    #[must_use]
    pub fn upshift(&self) -> &[f64; FORWARD_GEARS] {
        &self.upshift
    }

    #[must_use]
    pub fn downshift(&self) -> &[f64; FORWARD_GEARS] {
        &self.downshift
    }

    #[must_use]
    pub fn is_reversing(&self) -> bool {
        self.reversing
    }

    /// Forgets stuck detection state, e.g. after a race restart.
    pub fn reset(&mut self) {
        self.misaligned_steps = 0;
        self.reversing = false;
    }

    fn update_stuck(&mut self, state: &CarState) -> bool {
        if state.angle.abs() > STUCK_ANGLE {
            self.misaligned_steps += 1;
        } else {
            self.misaligned_steps = 0;
        }
        if self.misaligned_steps >= STUCK_STEPS {
            self.reversing = true;
        }
        // pointing back towards the track axis; free road ahead is not enough
        if self.reversing && state.angle * state.track_pos > 0.0 {
            self.reversing = false;
        }
        self.reversing
    }

    pub fn control(&mut self, state: &CarState) -> i32 {
        if self.update_stuck(state) {
            return -1;
        }
        let gear = state.gear;
        if gear < 1 {
            return 1;
        }
        let index = usize::try_from(gear - 1).map_or(0, |i| i.min(FORWARD_GEARS - 1));
        if state.rpm > self.upshift[index] && gear < 6 {
            gear + 1
        } else if state.rpm < self.downshift[index] && gear > 1 {
            gear - 1
        } else {
            gear
        }
    }
}

impl Tunable for GearModule {
    fn parameter_count(&self) -> usize {
        2 * FORWARD_GEARS
    }

    fn lower_bounds(&self) -> Vec<f64> {
        let mut lower = vec![UPSHIFT_RANGE.0; FORWARD_GEARS];
        lower.extend([DOWNSHIFT_RANGE.0; FORWARD_GEARS]);
        lower
    }

    fn upper_bounds(&self) -> Vec<f64> {
        let mut upper = vec![UPSHIFT_RANGE.1; FORWARD_GEARS];
        upper.extend([DOWNSHIFT_RANGE.1; FORWARD_GEARS]);
        upper
    }

    fn parameters(&self) -> Vec<f64> {
        self.upshift.iter().chain(&self.downshift).copied().collect()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(self.parameter_count(), parameters.len())?;
        let (up, down) = parameters.split_at(FORWARD_GEARS);
        self.upshift.copy_from_slice(up);
        self.downshift.copy_from_slice(down);
        Ok(())
    }
}
