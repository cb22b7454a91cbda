use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Dense integer identifier of a gene, as assigned by the gene index.
pub type GeneId = u32;

/// Dense integer identifier of an interaction type (e.g. protein-protein, regulatory).
pub type InteractionTypeId = u8;

/// Name of an experimental condition (sample).
pub type Condition = String;

/// Set of unique interaction identifiers.
///
/// Ordered so that iteration, and therefore every random draw made from it,
/// is reproducible for a fixed seed.
pub type InteractionSet = BTreeSet<InteractionId>;

const GENE_BITS: u32 = 29;
const TYPE_BITS: u32 = 6;
const GENE_MASK: u64 = (1 << GENE_BITS) - 1;
const TYPE_MASK: u64 = (1 << TYPE_BITS) - 1;

/// Packed identifier of a directed, typed interaction between two genes.
///
/// Layout (most significant first): 6 bits of interaction type, 29 bits of
/// source gene, 29 bits of target gene. Equality and ordering are defined on
/// the packed integer.
///
/// # Examples
///
/// ```rust
/// use netic_core::types::InteractionId;
///
/// let id = InteractionId::new(12, 7, 3).unwrap();
/// assert_eq!((id.from(), id.to(), id.interaction_type()), (12, 7, 3));
/// assert_eq!(id.to_string(), "12;7;3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InteractionId(u64);

impl InteractionId {
    /// Largest gene id that fits in the packed layout
    pub const MAX_GENE: GeneId = GENE_MASK as GeneId;
    /// Largest interaction type that fits in the packed layout
    pub const MAX_TYPE: InteractionTypeId = TYPE_MASK as InteractionTypeId;

    /// Pack `(from, to, type)`, rejecting values outside the bit budget.
    pub fn new(
        from: GeneId,
        to: GeneId,
        interaction_type: InteractionTypeId,
    ) -> Result<Self, NeticError> {
        if from > Self::MAX_GENE || to > Self::MAX_GENE || interaction_type > Self::MAX_TYPE {
            return Err(NeticError::InvalidIdentifier(format!(
                "interaction {from};{to};{interaction_type} exceeds the packed bit widths"
            )));
        }
        Ok(Self::pack(from, to, interaction_type))
    }

    const fn pack(from: GeneId, to: GeneId, interaction_type: InteractionTypeId) -> Self {
        Self(
            ((interaction_type as u64) << (2 * GENE_BITS))
                | ((from as u64) << GENE_BITS)
                | to as u64,
        )
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn from(self) -> GeneId {
        ((self.0 >> GENE_BITS) & GENE_MASK) as GeneId
    }

    #[must_use]
    pub const fn to(self) -> GeneId {
        (self.0 & GENE_MASK) as GeneId
    }

    #[must_use]
    pub const fn interaction_type(self) -> InteractionTypeId {
        ((self.0 >> (2 * GENE_BITS)) & TYPE_MASK) as InteractionTypeId
    }

    /// Whether `text` has the minimal interaction form `from;to;type`.
    ///
    /// Exactly two `;` separators, every other character an ASCII digit.
    #[must_use]
    pub fn is_interaction_format(text: &str) -> bool {
        text.matches(';').count() == 2 && text.chars().all(|c| c == ';' || c.is_ascii_digit())
    }
}

/// Whether `text` names a circuit path node (`startGene;condition`).
#[must_use]
pub fn is_path_format(text: &str) -> bool {
    text.matches(';').count() == 1
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.from(), self.to(), self.interaction_type())
    }
}

impl FromStr for InteractionId {
    type Err = NeticError;

    /// Parse the minimal form `from;to;type`; a leading `-` on any field is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(';');
        let (Some(from), Some(to), Some(kind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(NeticError::ParseError(format!(
                "interaction '{s}' is not of the form from;to;type"
            )));
        };
        Self::new(
            parse_absolute(from, s)?,
            parse_absolute(to, s)?,
            parse_absolute(kind, s)?,
        )
    }
}

fn parse_absolute<T: FromStr>(field: &str, line: &str) -> Result<T, NeticError> {
    field
        .strip_prefix('-')
        .unwrap_or(field)
        .parse()
        .map_err(|_| NeticError::ParseError(format!("invalid number '{field}' in '{line}'")))
}

/// Errors that can occur while loading inputs or running an optimization.
///
/// Variants are split in two classes: recoverable input problems, reported
/// while loading, and the fatal class ([`NeticError::is_fatal`]) that means
/// on-disk or in-memory state can no longer be trusted and the run must stop.
#[derive(Error, Debug)]
pub enum NeticError {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Error parsing input data
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Value does not fit its packed identifier layout
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// Invalid option or option combination
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A checkpoint line does not have the expected structure
    #[error("Corrupt checkpoint {file}:{line}: {reason}")]
    CorruptCheckpoint {
        file: PathBuf,
        line: usize,
        reason: String,
    },
    /// The same path identifier was read twice from a path list
    #[error("Duplicate path id {0} in path list")]
    DuplicatePath(usize),
    /// Writing a result or checkpoint file failed
    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

impl NeticError {
    /// Whether this error belongs to the abort-the-run class.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CorruptCheckpoint { .. } | Self::DuplicatePath(_) | Self::OutputWrite { .. }
        )
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

/// Format scores the way they appear in checkpoint and result files: `[a b c]`.
#[must_use]
pub fn format_scores(scores: &[f64]) -> String {
    let joined = scores
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{joined}]")
}

/// Parse a `[a b c]` score vector; an empty vector `[]` yields no scores.
pub fn parse_scores(text: &str) -> Result<Vec<f64>, NeticError> {
    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    inner
        .split_whitespace()
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|_| NeticError::ParseError(format!("invalid score '{value}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_id_round_trip() {
        let cases = [
            (0, 0, 0),
            (1, 2, 1),
            (InteractionId::MAX_GENE, 0, 5),
            (0, InteractionId::MAX_GENE, InteractionId::MAX_TYPE),
            (InteractionId::MAX_GENE, InteractionId::MAX_GENE, InteractionId::MAX_TYPE),
            (123_456, 98_765, 17),
        ];
        for (from, to, kind) in cases {
            let id = InteractionId::new(from, to, kind).unwrap();
            assert_eq!(id.from(), from);
            assert_eq!(id.to(), to);
            assert_eq!(id.interaction_type(), kind);
        }
    }

    #[test]
    fn test_interaction_id_rejects_out_of_range() {
        assert!(InteractionId::new(InteractionId::MAX_GENE + 1, 0, 0).is_err());
        assert!(InteractionId::new(0, 0, InteractionId::MAX_TYPE + 1).is_err());
    }

    #[test]
    fn test_interaction_id_ordering_follows_packing() {
        let low_type = InteractionId::new(9, 9, 0).unwrap();
        let high_type = InteractionId::new(0, 0, 1).unwrap();
        assert!(low_type < high_type);
    }

    #[test]
    fn test_interaction_parse() {
        let id: InteractionId = "4;5;2".parse().unwrap();
        assert_eq!(id, InteractionId::new(4, 5, 2).unwrap());

        let negated: InteractionId = "-4;5;2".parse().unwrap();
        assert_eq!(negated, id);

        assert!("4;5".parse::<InteractionId>().is_err());
        assert!("4;x;2".parse::<InteractionId>().is_err());
    }

    #[test]
    fn test_string_formats() {
        assert!(InteractionId::is_interaction_format("1;2;3"));
        assert!(!InteractionId::is_interaction_format("1;2"));
        assert!(!InteractionId::is_interaction_format("aux_1;2;3"));
        assert!(!InteractionId::is_interaction_format("-1;2;3"));
        assert!(is_path_format("17;condition_a"));
        assert!(!is_path_format("1;2;3"));
        assert!(!is_path_format("aux_12"));
    }

    #[test]
    fn test_scores_format() {
        assert_eq!(format_scores(&[0.5, 2.0, 1.25]), "[0.5 2 1.25]");
        assert_eq!(format_scores(&[]), "[]");
        assert_eq!(parse_scores("[0.5 2 1.25]").unwrap(), vec![0.5, 2.0, 1.25]);
        assert!(parse_scores("[]").unwrap().is_empty());
        assert_eq!(parse_scores("[-inf]").unwrap(), vec![f64::NEG_INFINITY]);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(NeticError::DuplicatePath(3).is_fatal());
        assert!(!NeticError::ParseError("x".into()).is_fatal());
        assert!(!NeticError::ConfigError("x".into()).is_fatal());
    }
}
