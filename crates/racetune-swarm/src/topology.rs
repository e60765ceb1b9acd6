//! Neighbourhood topologies.
//!
//! A topology decides whose personal bests a particle may learn from. It is
//! chosen by name ([`TopologyKind`]) and resolved once, for a fixed swarm
//! size, into an adjacency list ([`Topology`]). The graph is undirected, has
//! no self loops and no duplicate edges, and never changes afterwards.
//!
//! | kind      | neighbours of particle `i`                 |
//! |-----------|--------------------------------------------|
//! | `Ergodic` | every other particle                       |
//! | `Ring`    | `i - 1` and `i + 1` (mod N)                |
//! | `Star`    | particle 0 for `i > 0`; everyone for `i = 0` |

use serde::{Deserialize, Serialize};

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
pub enum TopologyKind {
    /// Fully connected.
    #[default]
    #[display("ergodic")]
    Ergodic,
    #[display("ring")]
    Ring,
    /// Hub at particle 0.
    #[display("star")]
    Star,
}

/// Resolved adjacency for a swarm of fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    kind: TopologyKind,
    adjacency: Vec<Vec<usize>>,
}

impl Topology {
    #[must_use]
    pub fn new(kind: TopologyKind, particle_count: usize) -> Self {
        let n = particle_count;
        let mut adjacency = vec![vec![]; n];
        match kind {
            TopologyKind::Ergodic => {
                for (i, neighbours) in adjacency.iter_mut().enumerate() {
                    neighbours.extend((0..n).filter(|&j| j != i));
                }
            }
            TopologyKind::Ring => {
                for (i, neighbours) in adjacency.iter_mut().enumerate() {
                    for j in [(i + n - 1) % n, (i + 1) % n] {
                        if j != i && !neighbours.contains(&j) {
                            neighbours.push(j);
                        }
                    }
                }
            }
            TopologyKind::Star => {
                for i in 1..n {
                    adjacency[0].push(i);
                    adjacency[i].push(0);
                }
            }
        }
        Self { kind, adjacency }
    }

    #[must_use]
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Neighbour indices of particle `index`, in scan order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn neighbours(&self, index: usize) -> &[usize] {
        &self.adjacency[index]
    }
}
