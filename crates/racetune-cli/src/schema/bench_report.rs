use chrono::{DateTime, Utc};
use racetune_swarm::params::SwarmParams;
use serde::{Deserialize, Serialize};

/// Outcome of one `bench` run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BenchReport {
    pub function: String,
    pub dimension: usize,
    pub seed: u64,
    pub swarm: SwarmParams,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: String,
    /// Best fitness in the swarm's own direction (negated cost when maximizing).
    pub best_fitness: f64,
    /// Objective value at the best position.
    pub best_cost: f64,
    pub best_position: Vec<f64>,
    pub finished_at: DateTime<Utc>,
}
