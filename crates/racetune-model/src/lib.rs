//! Tunable building blocks for hand-built control laws.
//!
//! This crate defines the contract that lets unrelated control modules share
//! one optimizable parameter vector, plus the pieces those modules are built
//! from:
//!
//! - [`tunable`] - the [`Tunable`](tunable::Tunable) capability, box
//!   constraints ([`Bounds`](tunable::Bounds)) and the fixed-order
//!   concatenation of several modules into one vector
//! - [`network`] - a small fully-connected feed-forward network that is itself
//!   a `Tunable` whose parameters are its weights and biases
//! - [`activation`] - activation functions used by network layers
//! - [`vector`] - sampling helpers taking an explicit random source
//!
//! # Architecture
//!
//! ```text
//! Control modules (thresholds, sensor weights, networks)
//!     ↓ implement
//! Tunable (count, bounds, get/set)
//!     ↓ concatenated by
//! TunableStack / concat_parameters / split_parameters
//!     ↓ optimized by
//! Particle swarm (racetune-swarm)
//! ```

pub mod activation;
pub mod network;
pub mod tunable;
pub mod vector;
