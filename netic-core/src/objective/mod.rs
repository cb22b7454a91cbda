//! Fitness functions and the dominance relation built on them.
//!
//! The objective set is fixed: network size, explained-sample diversity and
//! one circuit-coverage objective per path type. All three maximise, but the
//! comparison contract ([`Polarity`]) keeps the optimizer polarity-agnostic.

pub mod sample;

use crate::circuit::Circuit;
use crate::subnetwork::Subnetwork;

pub use sample::SampleMode;

/// Outcome of comparing two scores under an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Better,
    Equal,
    Worse,
}

/// Direction in which an objective improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Maximize,
    Minimize,
}

impl Polarity {
    /// Compare score `a` against score `b`.
    #[must_use]
    pub fn compare(self, a: f64, b: f64) -> Comparison {
        let (better, worse) = match self {
            Self::Maximize => (a > b, a < b),
            Self::Minimize => (a < b, a > b),
        };
        if better {
            Comparison::Better
        } else if worse {
            Comparison::Worse
        } else {
            Comparison::Equal
        }
    }

    /// The worst possible score.
    #[must_use]
    pub const fn bottom_score(self) -> f64 {
        match self {
            Self::Maximize => f64::NEG_INFINITY,
            Self::Minimize => f64::INFINITY,
        }
    }

    /// The best possible score.
    #[must_use]
    pub const fn top_score(self) -> f64 {
        match self {
            Self::Maximize => f64::INFINITY,
            Self::Minimize => f64::NEG_INFINITY,
        }
    }
}

/// One fitness function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `1 / interaction count`
    NetworkSize,
    /// Spread of explained conditions, summed over path types
    SampleCoverage(SampleMode),
    /// Sum of circuit evaluations for the path type at this index
    CircuitCoverage(usize),
}

impl Objective {
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        Polarity::Maximize
    }

    /// Score `network`. `circuits` holds the circuits of every path type.
    ///
    /// Empty subnetworks score the bottom score of the objective.
    #[must_use]
    pub fn compute(self, network: &Subnetwork, circuits: &[Vec<Circuit>]) -> f64 {
        if network.size() == 0 {
            return self.polarity().bottom_score();
        }
        match self {
            Self::NetworkSize => 1.0 / network.size() as f64,
            Self::SampleCoverage(mode) => circuits
                .iter()
                .map(|path_type| mode.score(&sample::explained_counts(network, path_type)))
                .sum(),
            Self::CircuitCoverage(path_type) => circuits
                .get(path_type)
                .map(|path_type| {
                    path_type
                        .iter()
                        .map(|circuit| circuit.evaluate(&network.intersect(circuit)))
                        .sum()
                })
                .unwrap_or(0.0),
        }
    }

    #[must_use]
    pub const fn is_circuit_coverage(self) -> bool {
        matches!(self, Self::CircuitCoverage(_))
    }
}

/// The active objectives with the circuits they evaluate.
#[derive(Debug, Clone)]
pub struct ObjectiveList {
    objectives: Vec<Objective>,
    circuits: Vec<Vec<Circuit>>,
}

impl ObjectiveList {
    #[must_use]
    pub fn new(objectives: Vec<Objective>, circuits: Vec<Vec<Circuit>>) -> Self {
        Self {
            objectives,
            circuits,
        }
    }

    /// Standard objective order: network size, sample coverage, then one
    /// circuit objective per path type.
    #[must_use]
    pub fn standard(
        circuits: Vec<Vec<Circuit>>,
        network_size: bool,
        sample_coverage: Option<SampleMode>,
    ) -> Self {
        let mut objectives = Vec::with_capacity(circuits.len() + 2);
        if network_size {
            objectives.push(Objective::NetworkSize);
        }
        if let Some(mode) = sample_coverage {
            objectives.push(Objective::SampleCoverage(mode));
        }
        objectives.extend((0..circuits.len()).map(Objective::CircuitCoverage));
        Self::new(objectives, circuits)
    }

    #[must_use]
    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    #[must_use]
    pub fn circuits(&self) -> &[Vec<Circuit>] {
        &self.circuits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    /// Compute every objective for `network`.
    #[must_use]
    pub fn score(&self, network: &Subnetwork) -> Vec<f64> {
        self.objectives
            .iter()
            .map(|objective| objective.compute(network, &self.circuits))
            .collect()
    }

    /// Score `network` unless it already carries a full score vector.
    pub fn set_scores(&self, network: &mut Subnetwork) {
        if network.scores().len() == self.objectives.len() {
            return;
        }
        let scores = self.score(network);
        network.set_scores(scores);
    }

    /// `p` dominates `q`: nowhere worse and somewhere strictly better.
    #[must_use]
    pub fn dominates(&self, p: &[f64], q: &[f64]) -> bool {
        let mut strictly_better = false;
        for (index, objective) in self.objectives.iter().enumerate() {
            match objective.polarity().compare(p[index], q[index]) {
                Comparison::Worse => return false,
                Comparison::Better => strictly_better = true,
                Comparison::Equal => {}
            }
        }
        strictly_better
    }
}
