//! bmssp: bounded multi-source shortest paths.
//!
//! Recursive engine in the style of Duan et al.'s O(m log^(2/3) n) algorithm:
//! a pivot finder prunes the frontier to sources with large shortest-path
//! subtrees, a batch-pull block structure replaces the comparison heap, and a
//! k-bounded Dijkstra settles the recursion floor. Given sources S and an
//! upper bound B, the driver returns a refined bound B' <= B together with
//! the set of vertices whose distance from S is final and below B'.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

pub mod base_case;
pub mod batch_heap;
pub mod bmssp;
pub mod dijkstra;
pub mod graph;
pub mod pivots;

pub use crate::base_case::base_case;
pub use crate::bmssp::{bmssp, bounded_multi_source_shortest_paths, initial_level, BmsspResult};
pub use crate::dijkstra::dijkstra;
pub use crate::graph::Graph;
pub use crate::pivots::find_pivots;

pub type Node = usize;
pub type Weight = f64;

/// Totally ordered priority value: a distance estimate broken by vertex id.
///
/// Every bound the engine threads around internally is a `DistKey`, so two
/// vertices never compare equal and a pull boundary never ties a pulled key.
/// A plain bound `b` enters as `DistKey::bound(b)`, which sits below every
/// vertex key of distance >= b and above every one of distance < b.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistKey {
    dist: OrderedFloat<Weight>,
    vertex: Node,
}

impl DistKey {
    pub fn new(dist: Weight, vertex: Node) -> Self {
        Self {
            dist: OrderedFloat(dist),
            vertex,
        }
    }

    /// Strict upper bound at distance `dist`: below every vertex key at or
    /// beyond `dist`, above every one short of it.
    pub fn bound(dist: Weight) -> Self {
        Self::new(dist, 0)
    }

    pub fn dist(&self) -> Weight {
        self.dist.0
    }

    pub fn vertex(&self) -> Node {
        self.vertex
    }
}

impl Ord for DistKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .cmp(&other.dist)
            .then(self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for DistKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("vertex {0} out of range")]
    InvalidIndex(Node),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reserved for a batch-size request the engine cannot represent; the
    /// recursion clamps its shift instead, so driver runs never produce this.
    #[error("batch size 1 << {0} exceeds platform capacity")]
    CapacityExceeded(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dist_key_orders_by_distance_then_vertex() {
        assert!(DistKey::new(1.0, 5) < DistKey::new(2.0, 0));
        assert!(DistKey::new(1.0, 2) < DistKey::new(1.0, 3));
        assert!(DistKey::new(f64::INFINITY, 0) > DistKey::new(1e300, usize::MAX));
    }

    #[test]
    fn bound_is_strict_on_distance() {
        let b = DistKey::bound(2.0);
        assert!(DistKey::new(1.999, 7) < b);
        assert!(DistKey::new(2.0, 0) >= b);
        assert!(DistKey::new(2.0, 3) >= b);
        // B = 0 excludes everything, including vertex 0 at distance zero.
        assert!(DistKey::new(0.0, 0) >= DistKey::bound(0.0));
    }
}
