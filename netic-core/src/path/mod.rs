//! Candidate paths and the index used to sample them.
//!
//! Paths come from the path-finding stage as a tab-separated list (see
//! [`io::read_path_list`]). Each path type gets one [`PathRepository`];
//! inside a repository paths are partitioned by their start condition and
//! kept in a fixed order so that a [`PathId`] always dereferences to the same
//! path across runs and across checkpoint/resume.

pub mod id;
pub mod io;
pub mod repository;

use std::cmp::Ordering;

use crate::types::{Condition, GeneId, InteractionId, InteractionSet};

pub use id::PathId;
pub use repository::{PathRepositories, PathRepository};

/// Identity of a compiled circuit: the start gene and condition of its paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CircuitHeader {
    pub condition: Condition,
    pub start_gene: GeneId,
}

impl CircuitHeader {
    #[must_use]
    pub fn new(condition: impl Into<Condition>, start_gene: GeneId) -> Self {
        Self {
            condition: condition.into(),
            start_gene,
        }
    }
}

/// A single path read from a path list. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePath {
    /// Line number in the path list
    pub id: usize,
    /// Total probability, `from_score * to_score * Π edge_scores`
    pub probability: f64,
    /// Interactions in path order
    pub interactions: Vec<InteractionId>,
    pub edge_scores: Vec<f64>,
    pub start_gene: GeneId,
    pub start_condition: Condition,
    pub end_gene: GeneId,
    pub end_condition: Condition,
    pub from_score: f64,
    pub to_score: f64,
    interaction_set: InteractionSet,
}

impl CandidatePath {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: usize,
        probability: f64,
        interactions: Vec<InteractionId>,
        edge_scores: Vec<f64>,
        (start_gene, start_condition): (GeneId, Condition),
        (end_gene, end_condition): (GeneId, Condition),
        from_score: f64,
        to_score: f64,
    ) -> Self {
        let interaction_set = interactions.iter().copied().collect();
        Self {
            id,
            probability,
            interactions,
            edge_scores,
            start_gene,
            start_condition,
            end_gene,
            end_condition,
            from_score,
            to_score,
            interaction_set,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// The unique interactions of this path.
    #[must_use]
    pub fn interaction_set(&self) -> &InteractionSet {
        &self.interaction_set
    }

    /// Repository order: shorter paths first, then by interaction sequence.
    #[must_use]
    pub fn repository_order(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.interactions.cmp(&other.interactions))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a path from `(from, to)` pairs of type 1, probability 1.
    pub fn path(id: usize, condition: &str, edges: &[(GeneId, GeneId)]) -> CandidatePath {
        let interactions: Vec<_> = edges
            .iter()
            .map(|&(from, to)| InteractionId::new(from, to, 1).unwrap())
            .collect();
        let start = edges.first().map_or(0, |edge| edge.0);
        let end = edges.last().map_or(0, |edge| edge.1);
        CandidatePath::new(
            id,
            1.0,
            interactions,
            vec![1.0; edges.len()],
            (start, condition.to_string()),
            (end, condition.to_string()),
            1.0,
            1.0,
        )
    }
}
