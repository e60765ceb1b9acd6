//! Round-robin particle swarm optimizer.
//!
//! Fitness does not come from a callable the optimizer can invoke whenever it
//! likes. Each sample is the outcome of a whole external episode (a race), so
//! the swarm hands out one particle at a time and waits for its fitness.
//!
//! # Protocol
//!
//! ```text
//! initialize(bounds, rng)
//! loop {
//!     id = next(rng)               // particle to evaluate
//!     install particle(id).position() and run an episode
//!     set_evaluation(id, fitness)
//!     update()
//!     if is_terminated() { break }
//! }
//! ```
//!
//! The cursor walks `0..N` and wraps. When it is back at 0 and at least one
//! evaluation has been recorded, [`SwarmOptimizer::next`] first moves every
//! particle at once (one generation), counts an iteration and decays the
//! inertia.
//!
//! # Termination
//!
//! Checked in this order, first match wins:
//!
//! 1. `iterations > max_iterations`
//! 2. `evaluations > max_evaluations`
//! 3. `stagnation >= max_stagnation`, where stagnation counts consecutive
//!    [`SwarmOptimizer::update`] calls that did not improve the global best
//!
//! Once a reason is reported it stays reported.

use racetune_model::tunable::Bounds;
use rand::Rng;
use tracing::{debug, info};

use crate::{
    error::SwarmError,
    params::SwarmParams,
    particle::{Particle, ParticleId},
    solution::Solution,
    topology::Topology,
};

/// Why a swarm stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TerminationReason {
    #[display("iteration limit reached")]
    IterationLimit,
    #[display("evaluation limit reached")]
    EvaluationLimit,
    #[display("no improvement for too long")]
    Stagnation,
}

#[derive(Debug, Clone)]
pub struct SwarmOptimizer {
    params: SwarmParams,
    dimension: usize,
    topology: Topology,
    particles: Vec<Particle>,
    initialized: bool,
    global_best: Option<Solution>,
    cursor: usize,
    inertia: f64,
    iterations: usize,
    evaluations: usize,
    stagnation: usize,
    termination: Option<TerminationReason>,
}

impl SwarmOptimizer {
    /// Creates an uninitialized swarm searching a `dimension`-dimensional space.
    pub fn new(params: SwarmParams, dimension: usize) -> Result<Self, SwarmError> {
        params.validate()?;
        let topology = Topology::new(params.topology, params.particle_count);
        let weights = params.weights();
        let particles = (0..params.particle_count)
            .map(|_| Particle::new(params.task, dimension, weights))
            .collect();
        Ok(Self {
            inertia: params.inertia,
            params,
            dimension,
            topology,
            particles,
            initialized: false,
            global_best: None,
            cursor: 0,
            iterations: 0,
            evaluations: 0,
            stagnation: 0,
            termination: None,
        })
    }

    /// Scatters every particle inside `bounds` and resets all progress.
    pub fn initialize<R>(&mut self, bounds: &Bounds, rng: &mut R) -> Result<(), SwarmError>
    where
        R: Rng + ?Sized,
    {
        if bounds.len() != self.dimension {
            return Err(SwarmError::DimensionMismatch {
                expected: self.dimension,
                actual: bounds.len(),
            });
        }
        if let Some(index) = bounds.first_unbounded() {
            return Err(SwarmError::Unbounded { index });
        }

        self.inertia = self.params.inertia;
        for particle in &mut self.particles {
            particle.set_inertia(self.inertia);
            particle.initialize(bounds, rng)?;
        }
        self.initialized = true;
        self.global_best = None;
        self.cursor = 0;
        self.iterations = 0;
        self.evaluations = 0;
        self.stagnation = 0;
        self.termination = None;
        debug!(
            particles = self.particles.len(),
            dimension = self.dimension,
            topology = %self.topology.kind(),
            "swarm initialized"
        );
        Ok(())
    }

    /// Returns the particle to evaluate next.
    pub fn next<R>(&mut self, rng: &mut R) -> Result<ParticleId, SwarmError>
    where
        R: Rng + ?Sized,
    {
        if !self.initialized {
            return Err(SwarmError::NotInitialized);
        }
        if self.cursor == 0 && self.evaluations > 0 {
            for particle in &mut self.particles {
                particle.r#move(rng)?;
            }
            self.iterations += 1;
            let inertia = self.inertia * self.params.inertia_decay;
            self.set_inertia(inertia);
            info!(
                iteration = self.iterations,
                evaluations = self.evaluations,
                inertia = self.inertia,
                best = ?self.best_fitness(),
                "swarm moved"
            );
            self.latch_termination();
        }
        let id = ParticleId(self.cursor);
        self.cursor = (self.cursor + 1) % self.particles.len();
        Ok(id)
    }

    /// Records the fitness of particle `id` and refreshes the neighbourhood
    /// bests of the particle and of each of its neighbours.
    pub fn set_evaluation(&mut self, id: ParticleId, fitness: f64) -> Result<(), SwarmError> {
        let index = id.index();
        let particle = self
            .particles
            .get_mut(index)
            .ok_or(SwarmError::UnknownParticle { id })?;
        let improved = particle.set_evaluation(fitness)?;
        debug!(particle = index, fitness, improved, "evaluation recorded");

        self.refresh_neighbourhood(index);
        for j in self.topology.neighbours(index).to_vec() {
            self.refresh_neighbourhood(j);
        }
        Ok(())
    }

    fn refresh_neighbourhood(&mut self, index: usize) {
        let candidates = self
            .topology
            .neighbours(index)
            .iter()
            .map(|&j| self.particles[j].personal_best().clone())
            .collect::<Vec<_>>();
        self.particles[index].refresh_neighbourhood_best(&candidates);
    }

    /// Counts one evaluation and promotes the best personal best to global
    /// best if it is strictly better.
    pub fn update(&mut self) {
        self.evaluations += 1;

        let task = self.params.task;
        let mut improved = false;
        for particle in &self.particles {
            let candidate = particle.personal_best();
            let better = match &self.global_best {
                Some(best) => candidate.is_better_than(best, task),
                None => !candidate.is_pending(),
            };
            if better {
                self.global_best = Some(candidate.clone());
                improved = true;
            }
        }

        if improved {
            self.stagnation = 0;
            info!(
                evaluations = self.evaluations,
                fitness = ?self.best_fitness(),
                "new global best"
            );
        } else {
            self.stagnation += 1;
        }
        self.latch_termination();
    }

    fn latch_termination(&mut self) {
        if self.termination.is_some() {
            return;
        }
        let reason = if self.iterations > self.params.max_iterations {
            TerminationReason::IterationLimit
        } else if self.evaluations > self.params.max_evaluations {
            TerminationReason::EvaluationLimit
        } else if self.stagnation >= self.params.max_stagnation {
            TerminationReason::Stagnation
        } else {
            return;
        };
        info!(
            %reason,
            iterations = self.iterations,
            evaluations = self.evaluations,
            best = ?self.best_fitness(),
            "swarm terminated"
        );
        self.termination = Some(reason);
    }

    #[must_use]
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    #[must_use]
    pub fn best_solution(&self) -> Option<&Solution> {
        self.global_best.as_ref()
    }

    #[must_use]
    pub fn best_fitness(&self) -> Option<f64> {
        self.global_best.as_ref().and_then(|s| s.fitness)
    }

    pub fn best_position(&self) -> Result<&[f64], SwarmError> {
        self.global_best
            .as_ref()
            .map(|s| s.position.as_slice())
            .ok_or(SwarmError::NoEvaluation)
    }

    pub fn particle(&self, id: ParticleId) -> Result<&Particle, SwarmError> {
        self.particles
            .get(id.index())
            .ok_or(SwarmError::UnknownParticle { id })
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn params(&self) -> &SwarmParams {
        &self.params
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    #[must_use]
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn set_cognitive_weight(&mut self, value: f64) {
        for particle in &mut self.particles {
            particle.set_cognitive_weight(value);
        }
    }

    pub fn set_social_weight(&mut self, value: f64) {
        for particle in &mut self.particles {
            particle.set_social_weight(value);
        }
    }

    pub fn set_inertia(&mut self, value: f64) {
        self.inertia = value;
        for particle in &mut self.particles {
            particle.set_inertia(value);
        }
    }
}
