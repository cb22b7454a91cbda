//! Readers for compiled circuit directories.
//!
//! Every circuit directory holds three files:
//!
//! - `compiled.cnf.nnf`: the compiler output. A header line, then one node
//!   per line: `L <lit>` (negative literal for `-<lit>`), `A <k> c1..ck` and
//!   `O <j> <k> c1..ck`.
//! - `translation_table`: the name of literal `i` on line `i` (1-based).
//! - `interactions`: `from;to;type;probability` weights of the literals.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::{Circuit, Leaf, LeafKind, Node};
use crate::types::{is_path_format, InteractionId, NeticError};

pub const CIRCUIT_FILE: &str = "compiled.cnf.nnf";
pub const TRANSLATION_TABLE_FILE: &str = "translation_table";
pub const INTERACTIONS_FILE: &str = "interactions";

/// Read the reverse translation table: literal names in literal order.
pub fn read_translation_table<P: AsRef<Path>>(path: P) -> Result<Vec<String>, NeticError> {
    let reader = BufReader::new(File::open(path)?);
    reader
        .lines()
        .map(|line| line.map_err(NeticError::from))
        .collect()
}

/// Read literal weights keyed by minimal interaction string.
pub fn read_interaction_weights<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, f64>, NeticError> {
    let reader = BufReader::new(File::open(path)?);
    let mut weights = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let [from, to, kind, probability] = fields.as_slice() else {
            return Err(NeticError::ParseError(format!(
                "interaction weight line should have 4 fields: {line}"
            )));
        };
        let probability = probability.trim().parse::<f64>().map_err(|_| {
            NeticError::ParseError(format!("invalid interaction probability: {line}"))
        })?;
        weights.insert(format!("{from};{to};{kind}"), probability);
    }
    Ok(weights)
}

/// Parse a compiled circuit.
///
/// The first line is a header and is skipped. Literal classification:
/// names in interaction form become positive/negative literals; any other
/// name is auxiliary, promoted to core when it is a non-negated path name
/// and demoted to erroneous when it is not an `aux_` variable.
pub fn parse_circuit<R: BufRead>(
    reader: R,
    translation: &[String],
    weights: &HashMap<String, f64>,
) -> Result<Circuit, NeticError> {
    let mut nodes = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        nodes.push(parse_node(line, translation, weights)?);
    }
    Circuit::new(nodes, translation.to_vec())
}

fn parse_node(
    line: &str,
    translation: &[String],
    weights: &HashMap<String, f64>,
) -> Result<Node, NeticError> {
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("L") => {
            let literal = fields
                .next()
                .ok_or_else(|| NeticError::ParseError(format!("leaf without literal: {line}")))?;
            Ok(Node::Leaf(parse_leaf(literal, translation, weights)))
        }
        Some("A") => Ok(Node::And(child_list(fields.skip(1), line)?)),
        Some("O") => Ok(Node::Or(child_list(fields.skip(2), line)?)),
        _ => Err(NeticError::ParseError(format!(
            "line could not be converted to a circuit node: {line}"
        ))),
    }
}

fn parse_leaf(literal: &str, translation: &[String], weights: &HashMap<String, f64>) -> Leaf {
    let negated = literal.starts_with('-');
    let literal = literal.trim_start_matches('-');
    let name = literal
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| translation.get(index))
        .cloned()
        .unwrap_or_else(|| literal.to_string());

    if InteractionId::is_interaction_format(&name) {
        let weight = weights.get(&name).copied().unwrap_or_else(|| {
            tracing::error!(interaction = %name, "interaction not found in interaction weights");
            0.0
        });
        return Leaf {
            interaction: name.parse().ok(),
            name,
            kind: if negated {
                LeafKind::Negative
            } else {
                LeafKind::Positive
            },
            negated,
            weight,
        };
    }

    let kind = if is_path_format(&name) && !negated {
        LeafKind::Core
    } else if name.contains("aux_") {
        LeafKind::Auxiliary
    } else {
        LeafKind::Erroneous
    };
    Leaf {
        name,
        kind,
        negated,
        interaction: None,
        weight: 0.0,
    }
}

fn child_list<'a>(
    fields: impl Iterator<Item = &'a str>,
    line: &str,
) -> Result<Vec<usize>, NeticError> {
    fields
        .map(|child| {
            child
                .parse()
                .map_err(|_| NeticError::ParseError(format!("invalid child index '{child}': {line}")))
        })
        .collect()
}

/// Load the circuit stored in `dir`.
pub fn load_circuit_dir<P: AsRef<Path>>(dir: P) -> Result<Circuit, NeticError> {
    let dir = dir.as_ref();
    let translation = read_translation_table(dir.join(TRANSLATION_TABLE_FILE))?;
    let weights = read_interaction_weights(dir.join(INTERACTIONS_FILE))?;
    let reader = BufReader::new(File::open(dir.join(CIRCUIT_FILE))?);
    parse_circuit(reader, &translation, &weights)
}

/// Load every circuit directory below `dir`, in sorted directory order.
///
/// Directories are parsed in parallel on the current rayon pool.
pub fn load_circuits<P: AsRef<Path>>(dir: P) -> Result<Vec<Circuit>, NeticError> {
    let dir = dir.as_ref();
    let mut circuit_dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    circuit_dirs.sort();

    let circuits = circuit_dirs
        .par_iter()
        .map(|circuit_dir| {
            load_circuit_dir(circuit_dir).map_err(|err| match err {
                NeticError::ParseError(reason) => NeticError::ParseError(format!(
                    "{}: {reason}",
                    circuit_dir.display()
                )),
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(dir = %dir.display(), circuits = circuits.len(), "loaded circuits");
    Ok(circuits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InteractionSet;
    use tempfile::tempdir;

    #[test]
    fn test_leaf_classification() {
        let translation: Vec<String> = ["1;2;1", "7;s1", "aux_4", "garbage", "7;s1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let weights: HashMap<String, f64> = [("1;2;1".to_string(), 0.4)].into();

        let positive = parse_leaf("1", &translation, &weights);
        assert_eq!(positive.kind, LeafKind::Positive);
        assert_eq!(positive.weight, 0.4);

        let negative = parse_leaf("-1", &translation, &weights);
        assert_eq!(negative.kind, LeafKind::Negative);
        assert!(negative.negated);

        assert_eq!(parse_leaf("2", &translation, &weights).kind, LeafKind::Core);
        assert_eq!(parse_leaf("3", &translation, &weights).kind, LeafKind::Auxiliary);
        assert_eq!(parse_leaf("-3", &translation, &weights).kind, LeafKind::Auxiliary);
        assert_eq!(parse_leaf("4", &translation, &weights).kind, LeafKind::Erroneous);
        assert_eq!(parse_leaf("-5", &translation, &weights).kind, LeafKind::Erroneous);
    }

    #[test]
    fn test_missing_weight_defaults_to_zero() {
        let translation = vec!["3;4;1".to_string()];
        let leaf = parse_leaf("1", &translation, &HashMap::new());
        assert_eq!(leaf.kind, LeafKind::Positive);
        assert_eq!(leaf.weight, 0.0);
    }

    #[test]
    fn test_untranslated_literal_keeps_number() {
        let leaf = parse_leaf("9", &[], &HashMap::new());
        assert_eq!(leaf.name, "9");
        assert_eq!(leaf.kind, LeafKind::Erroneous);
    }

    #[test]
    fn test_parse_node_errors() {
        assert!(parse_node("X 1 2", &[], &HashMap::new()).is_err());
        assert!(parse_node("A 2 0 z", &[], &HashMap::new()).is_err());
        assert!(parse_node("L", &[], &HashMap::new()).is_err());
    }

    fn write_circuit_dir(dir: &Path, condition: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(TRANSLATION_TABLE_FILE),
            format!("1;2;1\n2;3;1\n1;{condition}\n"),
        )
        .unwrap();
        fs::write(dir.join(INTERACTIONS_FILE), "1;2;1;0.5\n2;3;1;0.5\n").unwrap();
        fs::write(dir.join(CIRCUIT_FILE), "nnf 4 3 3\nL 1\nL 2\nL 3\nA 3 0 1 2\n").unwrap();
    }

    #[test]
    fn test_load_circuits_from_directory() {
        let root = tempdir().unwrap();
        write_circuit_dir(&root.path().join("b"), "s2");
        write_circuit_dir(&root.path().join("a"), "s1");
        fs::write(root.path().join("stray-file"), "ignored").unwrap();

        let circuits = load_circuits(root.path()).unwrap();
        let names: Vec<String> = circuits.iter().map(Circuit::name).collect();
        assert_eq!(names, vec!["1;s1", "1;s2"]);

        let present: InteractionSet = circuits[0].values().clone();
        assert!((circuits[0].evaluate(&present) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_interaction_weights_require_four_fields() {
        let root = tempdir().unwrap();
        let file = root.path().join(INTERACTIONS_FILE);
        fs::write(&file, "1;2;1\n").unwrap();
        assert!(read_interaction_weights(&file).is_err());
    }
}
