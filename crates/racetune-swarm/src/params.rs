use serde::{Deserialize, Serialize};

use crate::{solution::Task, topology::TopologyKind};

/// Swarm hyperparameters and stopping limits.
///
/// Missing fields take their [`Default`] values when deserialized, so a
/// configuration file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmParams {
    pub task: Task,
    pub particle_count: usize,
    pub topology: TopologyKind,
    /// Attraction towards the personal best (φ1).
    pub cognitive_weight: f64,
    /// Attraction towards the neighbourhood best (φ2).
    pub social_weight: f64,
    /// Initial velocity inertia (w).
    pub inertia: f64,
    /// Factor applied to the inertia after every generational move.
    pub inertia_decay: f64,
    pub max_iterations: usize,
    pub max_evaluations: usize,
    /// Consecutive updates without a new global best before stopping.
    pub max_stagnation: usize,
}

impl Default for SwarmParams {
    fn default() -> Self {
        Self {
            task: Task::Maximize,
            particle_count: 50,
            topology: TopologyKind::Ergodic,
            cognitive_weight: 1.87,
            social_weight: 1.24,
            inertia: 0.85,
            inertia_decay: 0.98,
            max_iterations: 1000,
            max_evaluations: 10_000,
            max_stagnation: 300,
        }
    }
}

/// Rejected hyperparameters.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ParamsError {
    #[display("particle_count must be at least 1")]
    NoParticles,
    #[display("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
}

impl SwarmParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.particle_count == 0 {
            return Err(ParamsError::NoParticles);
        }
        for (name, value) in [
            ("cognitive_weight", self.cognitive_weight),
            ("social_weight", self.social_weight),
            ("inertia", self.inertia),
            ("inertia_decay", self.inertia_decay),
        ] {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite { name, value });
            }
        }
        Ok(())
    }

    /// The per-particle coefficients at the start of a run.
    #[must_use]
    pub fn weights(&self) -> Weights {
        Weights {
            cognitive: self.cognitive_weight,
            social: self.social_weight,
            inertia: self.inertia,
        }
    }
}

/// Coefficients of the velocity update carried by each particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub cognitive: f64,
    pub social: f64,
    pub inertia: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let params: SwarmParams =
            serde_json::from_str(r#"{"particle_count": 8, "topology": "ring"}"#).unwrap();
        assert_eq!(params.particle_count, 8);
        assert_eq!(params.topology, TopologyKind::Ring);
        assert_eq!(params.max_stagnation, 300);
        assert_eq!(params.task, Task::Maximize);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let params = SwarmParams {
            particle_count: 0,
            ..SwarmParams::default()
        };
        assert_eq!(params.validate(), Err(ParamsError::NoParticles));

        let params = SwarmParams {
            inertia: f64::NAN,
            ..SwarmParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamsError::NotFinite { name: "inertia", .. })
        ));
    }
}
