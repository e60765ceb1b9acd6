//! Particle swarm optimization driven by asynchronously arriving fitness.
//!
//! The optimizer in this crate does not call an objective function. It hands
//! out one particle at a time, and the caller reports that particle's fitness
//! whenever the (slow, external) evaluation finishes. This fits a training
//! loop in which a single fitness sample is a whole race episode.
//!
//! # Key Components
//!
//! - [`optimizer::SwarmOptimizer`] - population, global best, round-robin
//!   dispatch and termination
//! - [`particle::Particle`] - position, velocity and the two attractors
//! - [`topology::Topology`] - who learns from whom (ergodic, ring, star)
//! - [`params::SwarmParams`] - hyperparameters and stopping limits
//! - [`solution::Solution`] - a position with an optional (pending) fitness
//!
//! # Example
//!
//! ```rust
//! use racetune_model::tunable::Bounds;
//! use racetune_swarm::{optimizer::SwarmOptimizer, params::SwarmParams};
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! let mut rng = Pcg32::seed_from_u64(1);
//! let params = SwarmParams {
//!     particle_count: 10,
//!     max_iterations: 20,
//!     ..SwarmParams::default()
//! };
//! let bounds = Bounds::uniform(2, -5.0, 5.0).unwrap();
//! let mut swarm = SwarmOptimizer::new(params, bounds.len()).unwrap();
//! swarm.initialize(&bounds, &mut rng).unwrap();
//!
//! while !swarm.is_terminated() {
//!     let id = swarm.next(&mut rng).unwrap();
//!     let x = swarm.particle(id).unwrap().position();
//!     let fitness = -(x[0] * x[0] + x[1] * x[1]);
//!     swarm.set_evaluation(id, fitness).unwrap();
//!     swarm.update();
//! }
//! assert!(swarm.best_fitness().is_some());
//! ```
//!
//! # Current Limitations
//!
//! - Only the maximizing direction is exercised by the rest of the system.
//!   [`solution::Task::Minimize`] uses the mirrored comparison but is otherwise
//!   untested in practice.
//! - Single-threaded: one dispatch → evaluate → update cycle at a time.

pub mod error;
pub mod optimizer;
pub mod params;
pub mod particle;
pub mod solution;
pub mod topology;
