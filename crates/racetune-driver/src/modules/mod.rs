//! The heuristic control laws and their fixed-order aggregate.
//!
//! Each module is a small formula over [`CarState`] whose constants are
//! exposed through [`Tunable`]. [`CarModules`] concatenates them in this
//! order:
//!
//! | module        | parameters |
//! |---------------|-----------:|
//! | accel/brake   | 1          |
//! | gear          | 12         |
//! | opponents     | 17         |
//! | steering      | 9          |
//! | target speed  | 122        |
//!
//! Persisted parameter files depend on this order.

use racetune_model::{
    network::NetworkError,
    tunable::{self, ParameterError, Segment, Tunable},
};

use crate::{control::CarControl, state::CarState};

pub use self::{
    accel_brake::AccelBrakeModule, gear::GearModule, opponents::OpponentsModule,
    steering::SteeringModule, target_speed::TargetSpeedModule,
};

mod accel_brake;
mod gear;
mod opponents;
mod steering;
mod target_speed;

/// Name and position of one module inside the aggregate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleLayout {
    pub name: &'static str,
    pub segment: Segment,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// All control modules driving one car.
#[derive(Debug, Clone, PartialEq)]
pub struct CarModules {
    pub accel_brake: AccelBrakeModule,
    pub gear: GearModule,
    pub opponents: OpponentsModule,
    pub steering: SteeringModule,
    pub target_speed: TargetSpeedModule,
}

impl CarModules {
    pub const NAMES: [&'static str; 5] = [
        "accel_brake",
        "gear",
        "opponents",
        "steering",
        "target_speed",
    ];

    pub fn new() -> Result<Self, NetworkError> {
        Ok(Self {
            accel_brake: AccelBrakeModule::default(),
            gear: GearModule::default(),
            opponents: OpponentsModule::default(),
            steering: SteeringModule::default(),
            target_speed: TargetSpeedModule::new()?,
        })
    }

    /// Members in concatenation order.
    #[must_use]
    pub fn members(&self) -> [&dyn Tunable; 5] {
        [
            &self.accel_brake,
            &self.gear,
            &self.opponents,
            &self.steering,
            &self.target_speed,
        ]
    }

    #[must_use]
    pub fn layout(&self) -> Vec<ModuleLayout> {
        let members = self.members();
        Self::NAMES
            .iter()
            .zip(tunable::segments(&members))
            .zip(members)
            .map(|((&name, segment), module)| ModuleLayout {
                name,
                segment,
                lower: module.lower_bounds(),
                upper: module.upper_bounds(),
            })
            .collect()
    }

    /// Clears per-episode state.
    pub fn reset(&mut self) {
        self.gear.reset();
    }

    /// Computes the commands for one simulation step.
    pub fn control(&mut self, state: &CarState) -> CarControl {
        let gear = self.gear.control(state);
        let target_speed = self.target_speed.control(state);
        let accel_brake = self.accel_brake.control(state, target_speed);
        let steer = self.steering.control(state);
        let (steer, accel_brake) = self.opponents.adjust(state, steer, accel_brake);
        CarControl::from_accel_brake(accel_brake, gear, steer)
    }
}

impl Tunable for CarModules {
    fn parameter_count(&self) -> usize {
        tunable::total_parameter_count(&self.members())
    }

    fn lower_bounds(&self) -> Vec<f64> {
        tunable::concat_lower_bounds(&self.members())
    }

    fn upper_bounds(&self) -> Vec<f64> {
        tunable::concat_upper_bounds(&self.members())
    }

    fn parameters(&self) -> Vec<f64> {
        tunable::concat_parameters(&self.members())
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        let mut members: [&mut dyn Tunable; 5] = [
            &mut self.accel_brake,
            &mut self.gear,
            &mut self.opponents,
            &mut self.steering,
            &mut self.target_speed,
        ];
        tunable::split_parameters(&mut members, parameters)
    }
}
