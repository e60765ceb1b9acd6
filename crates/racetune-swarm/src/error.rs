use crate::{params::ParamsError, particle::ParticleId};

/// Errors reported by [`Particle`](crate::particle::Particle) and
/// [`SwarmOptimizer`](crate::optimizer::SwarmOptimizer).
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SwarmError {
    #[display("invalid swarm parameters: {_0}")]
    #[from]
    Params(ParamsError),
    #[display("particle has not been initialized")]
    NotInitialized,
    #[display("bounds have {actual} dimensions but the swarm searches {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[display("dimension {index} has an infinite bound")]
    Unbounded { index: usize },
    #[display("fitness must be finite, got {value}")]
    NonFiniteFitness { value: f64 },
    #[display("no particle with id {id}")]
    UnknownParticle { id: ParticleId },
    #[display("no evaluation has been recorded yet")]
    NoEvaluation,
}
