//! Candidate solutions and the comparison rule that ranks them.

use serde::{Deserialize, Serialize};

/// Optimization direction.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Larger fitness is better.
    #[default]
    #[display("maximize")]
    Maximize,
    /// Smaller fitness is better.
    #[display("minimize")]
    Minimize,
}

impl Task {
    /// Whether `candidate` is strictly better than `incumbent`.
    #[must_use]
    pub fn is_improvement(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximize => candidate > incumbent,
            Self::Minimize => candidate < incumbent,
        }
    }
}

/// A position in parameter space paired with its fitness.
///
/// `fitness == None` marks a pending solution: one that was dispatched but not
/// evaluated yet. A pending solution never wins a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub position: Vec<f64>,
    pub fitness: Option<f64>,
}

impl Solution {
    #[must_use]
    pub fn pending(position: Vec<f64>) -> Self {
        Self {
            position,
            fitness: None,
        }
    }

    #[must_use]
    pub fn evaluated(position: Vec<f64>, fitness: f64) -> Self {
        Self {
            position,
            fitness: Some(fitness),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.fitness.is_none()
    }

    /// Whether `self` is strictly better than `other` under `task`.
    ///
    /// A pending `self` never wins; an evaluated `self` always beats a pending
    /// `other`.
    #[must_use]
    pub fn is_better_than(&self, other: &Self, task: Task) -> bool {
        match (self.fitness, other.fitness) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(a), Some(b)) => task.is_improvement(a, b),
        }
    }
}
