//! A single swarm member.
//!
//! A particle moves through the bounded search space pulled towards two
//! attractors: its own best position so far (cognitive term) and the best
//! position seen by its neighbours (social term).
//!
//! # Lifecycle
//!
//! ```text
//! new ──initialize──▶ ready (pending) ──set_evaluation──▶ evaluated
//!                          ▲                                  │
//!                          └───────────── move ◀──────────────┘
//! ```
//!
//! Evaluation and neighbourhood bookkeeping are split: [`Particle::set_evaluation`]
//! only touches the particle itself, while the owning optimizer feeds the
//! neighbours' personal bests to [`Particle::refresh_neighbourhood_best`].

use racetune_model::{tunable::Bounds, vector};
use rand::Rng;

use crate::{
    error::SwarmError,
    params::Weights,
    solution::{Solution, Task},
};

/// Index of a particle inside its swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{_0}")]
pub struct ParticleId(pub(crate) usize);

impl ParticleId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    task: Task,
    dimension: usize,
    weights: Weights,
    bounds: Option<Bounds>,
    velocity: Vec<f64>,
    current: Solution,
    personal_best: Solution,
    neighbourhood_best: Solution,
}

impl Particle {
    #[must_use]
    pub fn new(task: Task, dimension: usize, weights: Weights) -> Self {
        Self {
            task,
            dimension,
            weights,
            bounds: None,
            velocity: vec![0.0; dimension],
            current: Solution::pending(vec![0.0; dimension]),
            personal_best: Solution::default(),
            neighbourhood_best: Solution::default(),
        }
    }

    /// Places the particle uniformly inside `bounds` with a random velocity.
    ///
    /// Velocity component `i` is drawn from `U[-1, 1] * (upper[i] - lower[i])`.
    /// Re-initializing forgets every previous best.
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

        let position = vector::uniform_in(rng, bounds);
        self.velocity = vector::symmetric_uniform_in(rng, bounds);
        self.personal_best = Solution::pending(position.clone());
        self.neighbourhood_best = Solution::pending(position.clone());
        self.current = Solution::pending(position);
        self.bounds = Some(bounds.clone());
        Ok(())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.bounds.is_some()
    }

    /// Records the fitness of the current position.
    ///
    /// Returns whether the personal best was replaced, which happens only on a
    /// strict improvement.
    pub fn set_evaluation(&mut self, fitness: f64) -> Result<bool, SwarmError> {
        if !self.is_initialized() {
            return Err(SwarmError::NotInitialized);
        }
        if !fitness.is_finite() {
            return Err(SwarmError::NonFiniteFitness { value: fitness });
        }
        self.current.fitness = Some(fitness);
        let improved = self.current.is_better_than(&self.personal_best, self.task);
        if improved {
            self.personal_best = self.current.clone();
        }
        Ok(improved)
    }

    /// Recomputes the neighbourhood best from the neighbours' personal bests.
    ///
    /// Candidates are scanned in order and only a strictly better one replaces
    /// the running choice, so the first of several equal candidates wins.
    /// Without any evaluated candidate the particle follows its own personal
    /// best.
    pub fn refresh_neighbourhood_best<'a, I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = &'a Solution>,
    {
        let mut best: Option<&Solution> = None;
        for candidate in candidates {
            if !candidate.is_pending() && best.is_none_or(|b| candidate.is_better_than(b, self.task))
            {
                best = Some(candidate);
            }
        }
        self.neighbourhood_best = best.unwrap_or(&self.personal_best).clone();
    }

    /// Advances velocity and position by one step.
    ///
    /// `v' = w·v + φ1·U1∘(pbest − x) + φ2·U2∘(nbest − x)` and
    /// `x' = clip(x + v')`. An attractor that is still pending contributes
    /// nothing. The new position is pending until evaluated.
    pub fn r#move<R>(&mut self, rng: &mut R) -> Result<(), SwarmError>
    where
        R: Rng + ?Sized,
    {
        let Some(bounds) = &self.bounds else {
            return Err(SwarmError::NotInitialized);
        };
        let Weights {
            cognitive,
            social,
            inertia,
        } = self.weights;
        let use_personal = !self.personal_best.is_pending();
        let use_neighbourhood = !self.neighbourhood_best.is_pending();

        let u1 = vector::unit_uniform(rng, self.dimension);
        let u2 = vector::unit_uniform(rng, self.dimension);
        let position = &mut self.current.position;
        for i in 0..self.dimension {
            let x = position[i];
            let mut v = inertia * self.velocity[i];
            if use_personal {
                v += cognitive * u1[i] * (self.personal_best.position[i] - x);
            }
            if use_neighbourhood {
                v += social * u2[i] * (self.neighbourhood_best.position[i] - x);
            }
            self.velocity[i] = v;
            position[i] = x + v;
        }
        bounds.clip(position);
        self.current.fitness = None;
        Ok(())
    }

    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    #[must_use]
    pub fn position(&self) -> &[f64] {
        &self.current.position
    }

    #[must_use]
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Fitness of the current position, `None` while pending.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.current.fitness
    }

    #[must_use]
    pub fn current(&self) -> &Solution {
        &self.current
    }

    #[must_use]
    pub fn personal_best(&self) -> &Solution {
        &self.personal_best
    }

    #[must_use]
    pub fn neighbourhood_best(&self) -> &Solution {
        &self.neighbourhood_best
    }

    #[must_use]
    pub fn weights(&self) -> Weights {
        self.weights
    }

    pub fn set_cognitive_weight(&mut self, value: f64) {
        self.weights.cognitive = value;
    }

    pub fn set_social_weight(&mut self, value: f64) {
        self.weights.social = value;
    }

    pub fn set_inertia(&mut self, value: f64) {
        self.weights.inertia = value;
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: &[f64]) {
        self.current = Solution::pending(position.to_vec());
    }
}
