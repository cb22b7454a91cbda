//! Candidate solutions of the optimizer.
//!
//! A [`Subnetwork`] is a set of interactions together with the paths that
//! contributed them. Scores are cached and dropped whenever the interaction
//! set changes. Two subnetworks are duplicates when their interaction sets
//! are equal, whatever paths produced them.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use crate::circuit::Circuit;
use crate::path::{PathId, PathRepositories};
use crate::types::{format_scores, parse_scores, InteractionSet, NeticError};

#[derive(Debug, Clone)]
pub struct Subnetwork {
    interactions: InteractionSet,
    selected_paths: BTreeMap<PathId, InteractionSet>,
    scores: Vec<f64>,
    rank: Option<usize>,
    crowding_distance: f64,
}

impl Default for Subnetwork {
    fn default() -> Self {
        Self {
            interactions: InteractionSet::new(),
            selected_paths: BTreeMap::new(),
            scores: Vec::new(),
            rank: None,
            crowding_distance: -1.0,
        }
    }
}

impl Subnetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interactions.
    #[must_use]
    pub fn size(&self) -> usize {
        self.interactions.len()
    }

    #[must_use]
    pub fn interactions(&self) -> &InteractionSet {
        &self.interactions
    }

    #[must_use]
    pub fn selected_paths(&self) -> &BTreeMap<PathId, InteractionSet> {
        &self.selected_paths
    }

    /// Cached scores; empty when the subnetwork has not been scored.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn set_scores(&mut self, scores: Vec<f64>) {
        self.scores = scores;
    }

    /// Non-domination level, 1 for the first front.
    #[must_use]
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }

    pub fn set_rank(&mut self, rank: usize) {
        self.rank = Some(rank);
    }

    /// Crowding distance, `-1` until assigned.
    #[must_use]
    pub fn crowding_distance(&self) -> f64 {
        self.crowding_distance
    }

    pub fn set_crowding_distance(&mut self, distance: f64) {
        self.crowding_distance = distance;
    }

    /// Whether both subnetworks hold the same interactions.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        self.interactions == other.interactions
    }

    /// Whether `self` duplicates any member of `population`.
    #[must_use]
    pub fn is_duplicate_in(&self, population: &[Self]) -> bool {
        population.iter().any(|network| self.is_duplicate_of(network))
    }

    /// Select `id` and add its interactions. Invalidates the scores.
    pub fn add_path(&mut self, id: PathId, interactions: &InteractionSet) {
        self.interactions.extend(interactions.iter().copied());
        self.selected_paths.insert(id, interactions.clone());
        self.scores.clear();
    }

    /// Add one random path that brings at least one new interaction.
    ///
    /// Tries up to `number_of_paths` random draws; returns `false` and leaves
    /// the subnetwork untouched if none of them is novel.
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        repositories: &PathRepositories,
        rng: &mut R,
    ) -> bool {
        for _ in 0..=repositories.number_of_paths() {
            let Some(id) = repositories.random_path_id(rng) else {
                continue;
            };
            let Ok(path) = repositories.path_interaction_set(id) else {
                continue;
            };
            if path.iter().any(|interaction| !self.interactions.contains(interaction)) {
                self.add_path(id, path);
                return true;
            }
        }
        false
    }

    /// Remove one random selected path, unless it is the only one.
    ///
    /// The interaction set is rebuilt from the remaining paths, so
    /// interactions shared with another selected path are kept.
    pub fn reduce<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.selected_paths.len() <= 1 {
            return false;
        }
        let index = rng.gen_range(0..self.selected_paths.len());
        let Some(&id) = self.selected_paths.keys().nth(index) else {
            return false;
        };
        self.selected_paths.remove(&id);
        self.interactions = self.selected_paths.values().flatten().copied().collect();
        self.scores.clear();
        true
    }

    /// Interactions of this subnetwork that occur in `circuit`.
    #[must_use]
    pub fn intersect(&self, circuit: &Circuit) -> InteractionSet {
        let values = circuit.values();
        if values.len() < self.interactions.len() {
            values
                .iter()
                .filter(|interaction| self.interactions.contains(*interaction))
                .copied()
                .collect()
        } else {
            self.interactions.intersection(values).copied().collect()
        }
    }

    /// Rebuild a subnetwork from a checkpoint line, dereferencing paths
    /// through `repositories`.
    ///
    /// Returns the reason on malformed lines; callers attach file context.
    pub fn parse_checkpoint(line: &str, repositories: &PathRepositories) -> Result<Self, String> {
        let fields: Vec<&str> = line.split('\t').collect();
        let [interactions, paths, scores] = fields.as_slice() else {
            return Err(format!("expected 3 tab-separated fields, found {}", fields.len()));
        };

        let interactions = interactions
            .split_whitespace()
            .map(|edge| edge.parse())
            .collect::<Result<InteractionSet, NeticError>>()
            .map_err(|err| err.to_string())?;

        let mut selected_paths = BTreeMap::new();
        for path in paths.split(';').filter(|path| !path.is_empty()) {
            let id: PathId = path.parse().map_err(|err: NeticError| err.to_string())?;
            let set = repositories
                .path_interaction_set(id)
                .map_err(|err| err.to_string())?;
            selected_paths.insert(id, set.clone());
        }

        let scores = parse_scores(scores).map_err(|err| err.to_string())?;

        Ok(Self {
            interactions,
            selected_paths,
            scores,
            ..Self::default()
        })
    }
}

/// Checkpoint line: sorted interaction strings, sorted path ids, scores.
impl fmt::Display for Subnetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut interactions: Vec<String> =
            self.interactions.iter().map(ToString::to_string).collect();
        interactions.sort();
        let mut paths: Vec<String> = self.selected_paths.keys().map(ToString::to_string).collect();
        paths.sort();
        write!(
            f,
            "{}\t{}\t{}",
            interactions.join(" "),
            paths.join(";"),
            format_scores(&self.scores)
        )
    }
}
