//! Compiled probabilistic circuits (smooth d-DNNF) and their evaluation.
//!
//! A circuit is stored as a flat arena of [`Node`]s in which every child
//! index is smaller than its parent's index, so a single pass in index order
//! evaluates the whole graph bottom-up. The last node is the root.
//!
//! Evaluation is a weighted model count restricted to a set of present
//! interactions: leaves take their probability from [`Leaf::probability`],
//! OR nodes sum their children (determinism makes the branches exclusive) and
//! AND nodes multiply them (decomposability makes them independent).

pub mod io;
pub mod node;

use crate::types::{is_path_format, Condition, InteractionSet, NeticError};

pub use io::{load_circuit_dir, load_circuits, parse_circuit};
pub use node::{Leaf, LeafKind, Node};

/// Results in `(1, ROUNDING_LIMIT]` are floating point leakage and clamp to 1.
pub const ROUNDING_LIMIT: f64 = 1.00001;

/// One compiled circuit, keyed by `(start gene, condition)`.
#[derive(Debug, Clone)]
pub struct Circuit {
    nodes: Vec<Node>,
    start_gene: String,
    condition: Condition,
    values: InteractionSet,
    literal_names: Vec<String>,
}

impl Circuit {
    /// Build a circuit from nodes in evaluation order.
    ///
    /// `literal_names` is the reverse translation table: literal `i` is named
    /// `literal_names[i - 1]`.
    ///
    /// # Errors
    ///
    /// Fails if the node list is empty, a child index does not precede its
    /// parent, or no non-negated path node (`startGene;condition`) exists.
    pub fn new(nodes: Vec<Node>, literal_names: Vec<String>) -> Result<Self, NeticError> {
        if nodes.is_empty() {
            return Err(NeticError::ParseError("circuit has no nodes".into()));
        }
        for (index, node) in nodes.iter().enumerate() {
            if let Some(&child) = node.children().iter().find(|&&child| child >= index) {
                return Err(NeticError::ParseError(format!(
                    "node {index} references node {child}, which does not precede it"
                )));
            }
        }

        let path_node = nodes
            .iter()
            .filter_map(Node::as_leaf)
            .find(|leaf| !leaf.negated && is_path_format(&leaf.name))
            .ok_or_else(|| NeticError::ParseError("circuit has no path node".into()))?;
        let (start_gene, condition) = path_node
            .name
            .split_once(';')
            .map(|(gene, condition)| (gene.to_string(), condition.to_string()))
            .unwrap_or_default();

        let values = nodes
            .iter()
            .filter_map(Node::as_leaf)
            .filter_map(|leaf| leaf.interaction)
            .collect();

        Ok(Self {
            nodes,
            start_gene,
            condition,
            values,
            literal_names,
        })
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn start_gene(&self) -> &str {
        &self.start_gene
    }

    #[must_use]
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// `startGene;condition`
    #[must_use]
    pub fn name(&self) -> String {
        format!("{};{}", self.start_gene, self.condition)
    }

    /// Every interaction that appears as a literal in this circuit.
    #[must_use]
    pub fn values(&self) -> &InteractionSet {
        &self.values
    }

    /// Name of literal `literal` (1-based), if the translation table has it.
    #[must_use]
    pub fn literal_name(&self, literal: usize) -> Option<&str> {
        literal
            .checked_sub(1)
            .and_then(|index| self.literal_names.get(index))
            .map(String::as_str)
    }

    /// Probability that at least one path of this circuit holds, given the
    /// interactions in `intersection`.
    ///
    /// The empty set evaluates to exactly 0. Values slightly above 1 are
    /// clamped; larger overshoots are logged and returned unchanged.
    #[must_use]
    pub fn evaluate(&self, intersection: &InteractionSet) -> f64 {
        if intersection.is_empty() {
            return 0.0;
        }
        let mut values = vec![0.0; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            values[index] = match node {
                Node::Leaf(leaf) => leaf.probability(intersection),
                Node::Or(children) => children.iter().map(|&child| values[child]).sum(),
                Node::And(children) => {
                    let mut product = 1.0;
                    for &child in children {
                        product *= values[child];
                        if product == 0.0 {
                            break;
                        }
                    }
                    product
                }
            };
        }

        let score = values[values.len() - 1];
        if score > 1.0 && score <= ROUNDING_LIMIT {
            return 1.0;
        }
        if score > ROUNDING_LIMIT {
            tracing::error!(circuit = %self.name(), score, "circuit evaluation exceeds 1");
        }
        score
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use super::*;

    pub const P12: f64 = 0.95;
    pub const P13: f64 = 0.9;
    pub const P23: f64 = 0.85;
    pub const P24: f64 = 0.8;
    pub const P34: f64 = 0.75;

    pub fn weights() -> HashMap<String, f64> {
        [
            ("1;2;1", P12),
            ("1;3;1", P13),
            ("2;3;1", P23),
            ("2;4;1", P24),
            ("3;4;1", P34),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect()
    }

    /// Path 1 -> 2 -> 3 for gene 1 in condition `condition`.
    pub fn chain(condition: &str) -> Circuit {
        let table = vec!["1;2;1".to_string(), "2;3;1".into(), format!("1;{condition}")];
        let text = "nnf 4 3 3\nL 1\nL 2\nL 3\nA 3 0 1 2\n";
        parse_circuit(text.as_bytes(), &table, &weights()).unwrap()
    }

    /// Two alternative paths 1 -> 2 -> 4 and 1 -> 3 -> 4, compiled into a
    /// deterministic disjunction: `ab OR (NOT ab AND cd)`.
    pub fn diamond(condition: &str) -> Circuit {
        let table = vec![
            "1;2;1".to_string(),
            "2;4;1".into(),
            "1;3;1".into(),
            "3;4;1".into(),
            format!("1;{condition}"),
            "aux_1".into(),
        ];
        let text = "nnf 14 13 6\n\
                    L 1\n\
                    L 2\n\
                    A 2 0 1\n\
                    L -1\n\
                    L -2\n\
                    A 2 0 4\n\
                    O 1 2 3 5\n\
                    L 3\n\
                    L 4\n\
                    A 3 6 7 8\n\
                    O 0 2 2 9\n\
                    L 5\n\
                    L -6\n\
                    A 3 10 11 12\n";
        parse_circuit(text.as_bytes(), &table, &weights()).unwrap()
    }
}
