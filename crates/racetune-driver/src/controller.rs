//! Bridge between a [`Tunable`] control law and the swarm optimizer.
//!
//! In training mode the controller owns a [`SwarmOptimizer`] sized to the
//! module's parameter count. Every completed episode yields one fitness value,
//! which is credited to the particle whose position is currently installed;
//! the next particle's position is then installed and the best vector so far
//! is written to the parameter file.
//!
//! In deployment mode the controller installs a previously persisted vector
//! and only keeps the fitness history.
//!
//! ```text
//! training:   swarm.next ─▶ install ─▶ episode ─▶ update(fitness) ─┐
//!                 ▲                                               │
//!                 └──────────── set_evaluation / update ◀─────────┘
//! ```

use std::path::{Path, PathBuf};

use racetune_model::{
    network::NetworkError,
    tunable::{BoundsError, ParameterError, Tunable},
};
use racetune_stats::descriptive::DescriptiveStats;
use racetune_swarm::{
    error::SwarmError, optimizer::SwarmOptimizer, params::SwarmParams, particle::ParticleId,
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use crate::model_file::{self, ModelFileError};

/// Number of episodes between fitness summaries in the log.
pub const SUMMARY_INTERVAL: usize = 50;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ControllerError {
    #[display("{_0}")]
    Swarm(SwarmError),
    #[display("{_0}")]
    Parameters(ParameterError),
    #[display("{_0}")]
    Bounds(BoundsError),
    #[display("{_0}")]
    ModelFile(ModelFileError),
    #[display("{_0}")]
    Network(NetworkError),
    #[display("no parameter file configured")]
    #[from(ignore)]
    MissingModelPath,
}

/// Settings shared by both controller modes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Where the best vector is saved (training) or loaded from (deployment).
    pub model_path: Option<PathBuf>,
    /// Seed for the optimizer's random source; drawn from the OS when absent.
    pub seed: Option<u64>,
}

#[derive(Debug)]
enum Mode {
    Training {
        optimizer: SwarmOptimizer,
        current: ParticleId,
    },
    Deployment,
}

#[derive(Debug)]
pub struct Controller<M> {
    modules: M,
    mode: Mode,
    rng: Pcg32,
    seed: u64,
    model_path: Option<PathBuf>,
    history: Vec<f64>,
}

impl<M> Controller<M>
where
    M: Tunable,
{
    /// Starts a training run.
    ///
    /// The swarm is scattered inside the module bounds and the first
    /// dispatched particle's position is installed into `modules`.
    pub fn training(
        mut modules: M,
        params: &SwarmParams,
        options: ControllerOptions,
    ) -> Result<Self, ControllerError> {
        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);

        let bounds = modules.bounds()?;
        let mut optimizer = SwarmOptimizer::new(params.clone(), modules.parameter_count())?;
        optimizer.initialize(&bounds, &mut rng)?;
        let current = optimizer.next(&mut rng)?;
        modules.set_parameters(optimizer.particle(current)?.position())?;

        info!(
            seed,
            parameters = modules.parameter_count(),
            particles = params.particle_count,
            topology = %params.topology,
            "training controller ready"
        );
        Ok(Self {
            modules,
            mode: Mode::Training { optimizer, current },
            rng,
            seed,
            model_path: options.model_path,
            history: vec![],
        })
    }

    /// Installs the vector persisted at `options.model_path`.
    ///
    /// A missing or malformed file is an error; the modules are never left
    /// with made-up values.
    pub fn deployment(mut modules: M, options: ControllerOptions) -> Result<Self, ControllerError> {
        let path = options
            .model_path
            .ok_or(ControllerError::MissingModelPath)?;
        let parameters = model_file::load(&path, modules.parameter_count())?;
        modules.set_parameters(&parameters)?;
        info!(path = %path.display(), "deployment controller loaded parameters");

        let seed = options.seed.unwrap_or_default();
        Ok(Self {
            modules,
            mode: Mode::Deployment,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            model_path: Some(path),
            history: vec![],
        })
    }

    /// Feeds the fitness of the episode that just ended.
    ///
    /// A non-finite fitness is rejected before anything is recorded.
    pub fn update(&mut self, fitness: f64) -> Result<(), ControllerError> {
        if !fitness.is_finite() {
            return Err(SwarmError::NonFiniteFitness { value: fitness }.into());
        }
        self.history.push(fitness);
        if self.history.len().is_multiple_of(SUMMARY_INTERVAL) {
            self.log_summary();
        }

        let Mode::Training { optimizer, current } = &mut self.mode else {
            return Ok(());
        };
        optimizer.set_evaluation(*current, fitness)?;
        optimizer.update();
        *current = optimizer.next(&mut self.rng)?;
        self.modules
            .set_parameters(optimizer.particle(*current)?.position())?;
        debug!(particle = %current, "installed next particle");

        if let Some(path) = &self.model_path {
            let best = optimizer.best_position()?;
            if let Err(err) = model_file::save(path, best) {
                warn!(%err, "failed to save best parameters");
            }
        }
        Ok(())
    }

    fn log_summary(&self) {
        let window = &self.history[self.history.len().saturating_sub(SUMMARY_INTERVAL)..];
        if let Some(stats) = DescriptiveStats::new(window.iter().copied()) {
            info!(
                episodes = self.history.len(),
                min = stats.min,
                max = stats.max,
                mean = stats.mean,
                std_dev = stats.std_dev,
                "fitness summary"
            );
        }
    }

    /// Whether training has met its termination criterion.
    ///
    /// Always `false` in deployment mode.
    #[must_use]
    pub fn finished_learning(&self) -> bool {
        match &self.mode {
            Mode::Training { optimizer, .. } => optimizer.is_terminated(),
            Mode::Deployment => false,
        }
    }

    #[must_use]
    pub fn is_training(&self) -> bool {
        matches!(self.mode, Mode::Training { .. })
    }

    /// The swarm, when training.
    #[must_use]
    pub fn optimizer(&self) -> Option<&SwarmOptimizer> {
        match &self.mode {
            Mode::Training { optimizer, .. } => Some(optimizer),
            Mode::Deployment => None,
        }
    }

    /// Particle whose position is currently installed, when training.
    #[must_use]
    pub fn current_particle(&self) -> Option<ParticleId> {
        match &self.mode {
            Mode::Training { current, .. } => Some(*current),
            Mode::Deployment => None,
        }
    }

    /// Writes the swarm's best vector to the configured parameter file.
    pub fn save_model(&self) -> Result<(), ControllerError> {
        let path = self
            .model_path
            .as_deref()
            .ok_or(ControllerError::MissingModelPath)?;
        let best = match &self.mode {
            Mode::Training { optimizer, .. } => optimizer.best_position()?.to_vec(),
            Mode::Deployment => self.modules.parameters(),
        };
        model_file::save(path, &best)?;
        Ok(())
    }

    /// Replaces the installed parameters with the contents of `path`.
    pub fn load_model(&mut self, path: &Path) -> Result<(), ControllerError> {
        let parameters = model_file::load(path, self.modules.parameter_count())?;
        self.modules.set_parameters(&parameters)?;
        Ok(())
    }

    #[must_use]
    pub fn parameters(&self) -> Vec<f64> {
        self.modules.parameters()
    }

    pub fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ControllerError> {
        self.modules.set_parameters(parameters)?;
        Ok(())
    }

    #[must_use]
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.modules.lower_bounds()
    }

    #[must_use]
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.modules.upper_bounds()
    }

    #[must_use]
    pub fn modules(&self) -> &M {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut M {
        &mut self.modules
    }

    /// Fitness of every episode fed so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use racetune_model::tunable::{Bounds, ParameterBlock, TunableStack};
    use racetune_swarm::topology::TopologyKind;

    use super::*;

    fn stack() -> TunableStack {
        TunableStack::new()
            .with(ParameterBlock::new(Bounds::uniform(3, -1.0, 1.0).unwrap()))
            .with(ParameterBlock::new(Bounds::uniform(2, 0.0, 10.0).unwrap()))
    }

    fn params() -> SwarmParams {
        SwarmParams {
            particle_count: 4,
            topology: TopologyKind::Ring,
            max_evaluations: 40,
            ..SwarmParams::default()
        }
    }

    fn options(model_path: Option<PathBuf>) -> ControllerOptions {
        ControllerOptions {
            model_path,
            seed: Some(17),
        }
    }

    #[test]
    fn test_training_installs_first_particle() {
        let controller = Controller::training(stack(), &params(), options(None)).unwrap();
        let optimizer = controller.optimizer().unwrap();
        let current = controller.current_particle().unwrap();
        assert_eq!(current.index(), 0);
        assert_eq!(
            controller.parameters(),
            optimizer.particle(current).unwrap().position()
        );
        assert!(!controller.finished_learning());
        assert_eq!(controller.lower_bounds(), vec![-1.0, -1.0, -1.0, 0.0, 0.0]);
        assert_eq!(controller.upper_bounds(), vec![1.0, 1.0, 1.0, 10.0, 10.0]);
    }

    #[test]
    fn test_unbounded_modules_cannot_train() {
        let modules = ParameterBlock::new(Bounds::unbounded(2));
        assert!(matches!(
            Controller::training(modules, &params(), options(None)),
            Err(ControllerError::Swarm(SwarmError::Unbounded { index: 0 }))
        ));
    }

    #[test]
    fn test_update_dispatches_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.txt");
        let mut controller =
            Controller::training(stack(), &params(), options(Some(path.clone()))).unwrap();

        let mut episodes = 0;
        while !controller.finished_learning() {
            let fitness = -controller.parameters().iter().map(|x| x * x).sum::<f64>();
            controller.update(fitness).unwrap();
            episodes += 1;

            let optimizer = controller.optimizer().unwrap();
            let current = controller.current_particle().unwrap();
            assert_eq!(
                controller.parameters(),
                optimizer.particle(current).unwrap().position()
            );
            let saved = model_file::load(&path, 5).unwrap();
            assert_eq!(saved, optimizer.best_position().unwrap());
        }
        assert_eq!(episodes, 41);
        assert_eq!(controller.history().len(), 41);
    }

    #[test]
    fn test_seed_makes_training_reproducible() {
        let run = || {
            let mut controller = Controller::training(stack(), &params(), options(None)).unwrap();
            for i in 0..12 {
                controller.update(f64::from(i % 5)).unwrap();
            }
            controller.parameters()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_deployment_loads_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.txt");
        let vector = vec![0.5, -0.25, 0.0, 3.0, 9.5];
        model_file::save(&path, &vector).unwrap();

        let mut controller = Controller::deployment(stack(), options(Some(path))).unwrap();
        assert_eq!(controller.parameters(), vector);
        assert!(!controller.is_training());
        assert!(controller.optimizer().is_none());
        controller.update(123.0).unwrap();
        assert!(!controller.finished_learning());
        assert_eq!(controller.parameters(), vector);
        assert_eq!(controller.history(), &[123.0]);
    }

    #[test]
    fn test_deployment_never_zero_fills() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Controller::deployment(stack(), options(Some(dir.path().join("missing.txt")))),
            Err(ControllerError::ModelFile(ModelFileError::Io { .. }))
        ));
        assert!(matches!(
            Controller::deployment(stack(), options(None)),
            Err(ControllerError::MissingModelPath)
        ));

        let short = dir.path().join("short.txt");
        model_file::save(&short, &[1.0, 2.0]).unwrap();
        assert!(matches!(
            Controller::deployment(stack(), options(Some(short))),
            Err(ControllerError::ModelFile(
                ModelFileError::LengthMismatch { .. }
            ))
        ));
    }

    #[test]
    fn test_non_finite_fitness_is_not_recorded() {
        let mut controller = Controller::training(stack(), &params(), options(None)).unwrap();
        let installed = controller.parameters();
        assert!(matches!(
            controller.update(f64::NAN),
            Err(ControllerError::Swarm(SwarmError::NonFiniteFitness { .. }))
        ));
        assert!(controller.history().is_empty());
        assert_eq!(controller.optimizer().unwrap().evaluations(), 0);
        assert_eq!(controller.parameters(), installed);

        controller.update(2.0).unwrap();
        assert_eq!(controller.history(), &[2.0]);
        assert_eq!(controller.optimizer().unwrap().evaluations(), 1);
    }

    #[test]
    fn test_save_model_writes_best_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.txt");
        let mut controller = Controller::training(stack(), &params(), options(None)).unwrap();
        controller.update(4.0).unwrap();
        controller.update(7.0).unwrap();
        assert!(matches!(
            controller.save_model(),
            Err(ControllerError::MissingModelPath)
        ));

        let mut controller =
            Controller::training(stack(), &params(), options(Some(path.clone()))).unwrap();
        controller.update(4.0).unwrap();
        controller.update(7.0).unwrap();
        fs::remove_file(&path).unwrap();
        controller.save_model().unwrap();
        let best = controller.optimizer().unwrap().best_position().unwrap();
        assert_eq!(model_file::load(&path, 5).unwrap(), best);
    }

    #[test]
    fn test_load_model_replaces_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = Controller::training(stack(), &params(), options(None)).unwrap();

        let good = dir.path().join("good.txt");
        let vector = [0.25, -0.5, 1.0, 2.0, 8.0];
        model_file::save(&good, &vector).unwrap();
        controller.load_model(&good).unwrap();
        assert_eq!(controller.parameters(), vector);

        let short = dir.path().join("short.txt");
        model_file::save(&short, &[1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            controller.load_model(&short),
            Err(ControllerError::ModelFile(ModelFileError::LengthMismatch {
                expected: 5,
                actual: 3,
                ..
            }))
        ));
        assert_eq!(controller.parameters(), vector);
    }

    #[test]
    fn test_aggregate_round_trip() {
        let mut controller = Controller::training(stack(), &params(), options(None)).unwrap();
        let vector = vec![0.1, 0.2, 0.3, 4.0, 5.0];
        controller.set_parameters(&vector).unwrap();
        assert_eq!(controller.parameters(), vector);
        controller
            .set_parameters(&controller.parameters())
            .unwrap();
        assert_eq!(controller.parameters(), vector);
        assert!(matches!(
            controller.set_parameters(&[1.0]),
            Err(ControllerError::Parameters(ParameterError {
                expected: 5,
                actual: 1
            }))
        ));
    }
}
