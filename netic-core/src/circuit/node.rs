use crate::types::{InteractionId, InteractionSet};

/// How a leaf contributes to the weighted model count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Interaction literal: its weight if the interaction is present, else 0
    Positive,
    /// Negated interaction literal: `1 - weight` if present, else 1
    Negative,
    /// Compiler bookkeeping variable, always 1
    Auxiliary,
    /// Non-negated path variable (`startGene;condition`), always 1
    Core,
    /// Literal that is neither an interaction nor an auxiliary variable, always 0
    Erroneous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub name: String,
    pub kind: LeafKind,
    pub negated: bool,
    pub interaction: Option<InteractionId>,
    pub weight: f64,
}

impl Leaf {
    /// Probability of this leaf given the set of present interactions.
    #[must_use]
    pub fn probability(&self, present: &InteractionSet) -> f64 {
        match self.kind {
            LeafKind::Positive => match self.interaction {
                Some(id) if present.contains(&id) => self.weight,
                _ => 0.0,
            },
            LeafKind::Negative => match self.interaction {
                Some(id) if present.contains(&id) => 1.0 - self.weight,
                _ => 1.0,
            },
            LeafKind::Auxiliary | LeafKind::Core => 1.0,
            LeafKind::Erroneous => 0.0,
        }
    }
}

/// Circuit node. Children are indices of earlier nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Leaf),
    And(Vec<usize>),
    Or(Vec<usize>),
}

impl Node {
    #[must_use]
    pub fn children(&self) -> &[usize] {
        match self {
            Self::Leaf(_) => &[],
            Self::And(children) | Self::Or(children) => children,
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }
}
