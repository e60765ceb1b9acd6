//! Car controller tuned by particle swarm optimization.
//!
//! [`modules::CarModules`] turns a [`state::CarState`] into a
//! [`control::CarControl`] with five heuristic control laws whose constants
//! form one flat parameter vector. [`controller::Controller`] connects any
//! [`Tunable`](racetune_model::tunable::Tunable) to the swarm, and
//! [`driver::Driver`] adds race episode handling on top.
//!
//! ```text
//! CarState ─▶ Driver::drive ─▶ CarModules::control ─▶ CarControl
//!                  │
//!          Driver::restart ─▶ fitness ─▶ Controller::update ─▶ SwarmOptimizer
//!                                               │
//!                                     model_file::save (best vector)
//! ```

pub mod control;
pub mod controller;
pub mod driver;
pub mod model_file;
pub mod modules;
pub mod state;
