//! Episode bookkeeping around a [`Controller`] over [`CarModules`].
//!
//! The simulator calls [`Driver::drive`] once per step and
//! [`Driver::restart`] whenever a race ends, either because the driver asked
//! for it or because the simulator decided so. Each restart closes one
//! episode and turns the last sensor snapshot into a fitness value.

use racetune_swarm::params::SwarmParams;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    control::CarControl,
    controller::{Controller, ControllerError, ControllerOptions},
    modules::CarModules,
    state::{CarState, TRACK_SENSORS},
};

/// When a training episode is cut short, and which results count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeLimits {
    /// Seconds on the current lap before the episode is abandoned.
    pub max_lap_time: f64,
    pub max_damage: f64,
    pub min_fuel: f64,
    /// Steps allowed before a negative distance counts as no progress.
    pub warmup_steps: u64,
    /// Fitness values whose magnitude does not exceed this are discarded.
    pub min_fitness_magnitude: f64,
}

impl Default for EpisodeLimits {
    fn default() -> Self {
        Self {
            max_lap_time: 300.0,
            max_damage: 1000.0,
            min_fuel: 0.05,
            warmup_steps: 100,
            min_fitness_magnitude: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RestartReason {
    #[display("lap time limit")]
    LapTime,
    #[display("damage limit")]
    Damage,
    #[display("out of fuel")]
    Fuel,
    #[display("no progress")]
    NoProgress,
}

impl EpisodeLimits {
    /// First limit `state` breaks after `step` steps of the episode.
    #[must_use]
    pub fn restart_reason(&self, state: &CarState, step: u64) -> Option<RestartReason> {
        if state.cur_lap_time > self.max_lap_time {
            Some(RestartReason::LapTime)
        } else if state.damage > self.max_damage {
            Some(RestartReason::Damage)
        } else if state.fuel < self.min_fuel {
            Some(RestartReason::Fuel)
        } else if step > self.warmup_steps && state.dist_raced < 0.0 {
            Some(RestartReason::NoProgress)
        } else {
            None
        }
    }
}

/// Episode fitness: distance covered, penalized by twice the damage taken.
#[must_use]
pub fn episode_fitness(state: &CarState) -> f64 {
    state.dist_raced - 2.0 * state.damage
}

#[derive(Debug)]
pub struct Driver {
    controller: Controller<CarModules>,
    limits: EpisodeLimits,
    last_state: Option<CarState>,
    restart_requested: bool,
    step: u64,
}

impl Driver {
    #[must_use]
    pub fn new(controller: Controller<CarModules>, limits: EpisodeLimits) -> Self {
        Self {
            controller,
            limits,
            last_state: None,
            restart_requested: false,
            step: 0,
        }
    }

    /// A driver that tunes freshly constructed modules with a new swarm.
    pub fn training(
        params: &SwarmParams,
        limits: EpisodeLimits,
        options: ControllerOptions,
    ) -> Result<Self, ControllerError> {
        let controller = Controller::training(CarModules::new()?, params, options)?;
        Ok(Self::new(controller, limits))
    }

    /// A driver running a persisted parameter vector.
    pub fn deployment(
        limits: EpisodeLimits,
        options: ControllerOptions,
    ) -> Result<Self, ControllerError> {
        let controller = Controller::deployment(CarModules::new()?, options)?;
        Ok(Self::new(controller, limits))
    }

    /// Rangefinder directions to request from the simulator, in degrees.
    #[must_use]
    pub fn rangefinder_angles() -> [f64; TRACK_SENSORS] {
        let mut angles = [0.0; TRACK_SENSORS];
        let mut angle = -90.0;
        for slot in &mut angles {
            *slot = angle;
            angle += 10.0;
        }
        angles
    }

    /// Computes the commands for one step.
    ///
    /// While training, a broken episode limit sets [`CarControl::restart`].
    pub fn drive(&mut self, state: &CarState) -> CarControl {
        self.step += 1;
        let mut control = self.controller.modules_mut().control(state);

        if self.controller.is_training()
            && !self.restart_requested
            && let Some(reason) = self.limits.restart_reason(state, self.step)
        {
            info!(
                %reason,
                step = self.step,
                dist_raced = state.dist_raced,
                damage = state.damage,
                "requesting restart"
            );
            self.restart_requested = true;
        }
        control.restart = self.restart_requested;
        self.last_state = Some(state.clone());
        control
    }

    /// Closes the current episode.
    ///
    /// Returns the fitness that was fed to the controller, or `None` when
    /// there was nothing to score or the result was too small to count.
    pub fn restart(&mut self) -> Result<Option<f64>, ControllerError> {
        self.restart_requested = false;
        self.step = 0;
        self.controller.modules_mut().reset();

        let Some(state) = &mut self.last_state else {
            return Ok(None);
        };
        let fitness = episode_fitness(state);
        state.dist_raced = 0.0;

        if fitness.abs() <= self.limits.min_fitness_magnitude {
            warn!(
                fitness,
                threshold = self.limits.min_fitness_magnitude,
                "discarding episode with negligible fitness"
            );
            return Ok(None);
        }
        self.controller.update(fitness)?;
        info!(fitness, episodes = self.controller.history().len(), "episode finished");
        Ok(Some(fitness))
    }

    /// Training has finished and the simulator may be shut down.
    #[must_use]
    pub fn ready_to_shutdown(&self) -> bool {
        self.controller.is_training() && self.controller.finished_learning()
    }

    #[must_use]
    pub fn is_restart_requested(&self) -> bool {
        self.restart_requested
    }

    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    #[must_use]
    pub fn limits(&self) -> &EpisodeLimits {
        &self.limits
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<CarModules> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<CarModules> {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use racetune_model::tunable::Tunable as _;
    use racetune_swarm::topology::TopologyKind;

    use super::*;

    fn params() -> SwarmParams {
        SwarmParams {
            particle_count: 3,
            topology: TopologyKind::Ring,
            max_evaluations: 2,
            ..SwarmParams::default()
        }
    }

    fn training_driver() -> Driver {
        let options = ControllerOptions {
            model_path: None,
            seed: Some(3),
        };
        Driver::training(&params(), EpisodeLimits::default(), options).unwrap()
    }

    fn cruising() -> CarState {
        CarState {
            speed_x: 80.0,
            fuel: 50.0,
            dist_raced: 500.0,
            track: [50.0; TRACK_SENSORS],
            ..CarState::default()
        }
    }

    #[test]
    fn test_rangefinder_angles() {
        let angles = Driver::rangefinder_angles();
        assert_eq!(angles[0], -90.0);
        assert_eq!(angles[9], 0.0);
        assert_eq!(angles[18], 90.0);
        assert!(angles.windows(2).all(|w| w[1] - w[0] == 10.0));
    }

    #[test]
    fn test_restart_reasons() {
        let limits = EpisodeLimits::default();
        let state = cruising();
        assert_eq!(limits.restart_reason(&state, 1), None);

        let late = CarState {
            cur_lap_time: 301.0,
            ..cruising()
        };
        assert_eq!(limits.restart_reason(&late, 1), Some(RestartReason::LapTime));

        let wrecked = CarState {
            damage: 1001.0,
            ..cruising()
        };
        assert_eq!(limits.restart_reason(&wrecked, 1), Some(RestartReason::Damage));

        let empty = CarState {
            fuel: 0.01,
            ..cruising()
        };
        assert_eq!(limits.restart_reason(&empty, 1), Some(RestartReason::Fuel));

        let backwards = CarState {
            dist_raced: -3.0,
            ..cruising()
        };
        assert_eq!(limits.restart_reason(&backwards, 100), None);
        assert_eq!(
            limits.restart_reason(&backwards, 101),
            Some(RestartReason::NoProgress)
        );
    }

    #[test]
    fn test_restart_reason_display() {
        assert_eq!(RestartReason::LapTime.to_string(), "lap time limit");
        assert_eq!(RestartReason::NoProgress.to_string(), "no progress");
    }

    #[test]
    fn test_limits_partial_config() {
        let limits: EpisodeLimits = serde_json::from_str(r#"{"max_damage": 50.0}"#).unwrap();
        assert_eq!(limits.max_damage, 50.0);
        assert_eq!(limits.warmup_steps, 100);
    }

    #[test]
    fn test_drive_requests_restart_once_limit_broken() {
        let mut driver = training_driver();
        assert!(!driver.drive(&cruising()).restart);

        let wrecked = CarState {
            damage: 2000.0,
            ..cruising()
        };
        assert!(driver.drive(&wrecked).restart);
        assert!(driver.drive(&cruising()).restart);
        assert_eq!(driver.step(), 3);
    }

    #[test]
    fn test_restart_feeds_fitness_and_installs_next_particle() {
        let mut driver = training_driver();
        let before = driver.controller().parameters();
        assert_eq!(before.len(), driver.controller().modules().parameter_count());

        driver.drive(&CarState {
            damage: 100.0,
            ..cruising()
        });
        assert_eq!(driver.restart().unwrap(), Some(300.0));
        assert_eq!(driver.controller().history(), &[300.0]);
        assert_eq!(driver.step(), 0);
        assert!(!driver.is_restart_requested());
        assert_ne!(driver.controller().parameters(), before);
    }

    #[test]
    fn test_small_fitness_is_discarded() {
        let mut driver = training_driver();
        driver.drive(&CarState {
            dist_raced: 5.0,
            ..cruising()
        });
        assert_eq!(driver.restart().unwrap(), None);
        assert!(driver.controller().history().is_empty());
    }

    #[test]
    fn test_repeated_restart_does_not_count_distance_twice() {
        let mut driver = training_driver();
        driver.drive(&CarState {
            damage: 20.0,
            ..cruising()
        });
        assert_eq!(driver.restart().unwrap(), Some(460.0));
        assert_eq!(driver.restart().unwrap(), Some(-40.0));
    }

    #[test]
    fn test_restart_without_any_step() {
        let mut driver = training_driver();
        assert_eq!(driver.restart().unwrap(), None);
    }

    #[test]
    fn test_ready_to_shutdown_after_termination() {
        let mut driver = training_driver();
        let mut episodes = 0;
        while !driver.ready_to_shutdown() {
            driver.drive(&cruising());
            driver.restart().unwrap();
            episodes += 1;
        }
        assert_eq!(episodes, 3);
        assert!(driver.controller().finished_learning());
    }
}
