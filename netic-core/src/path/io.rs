//! Path list reader.
//!
//! One path per line, tab separated:
//!
//! ```text
//! start  [end]  probability  G1->G2<-G3  fromScore  [e1 e2]  toScore  [t1 t2]
//! ```
//!
//! The end condition is omitted when it equals the start condition. `->` is
//! a downstream step (`G1` regulates `G2`), `<-` an upstream step (`G3`
//! regulates `G2`). Edge scores and interaction types are given per step.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{CandidatePath, CircuitHeader};
use crate::interaction_store::{GeneIdMap, InteractionStore};
use crate::types::{GeneId, InteractionId, InteractionTypeId, NeticError};

/// Tolerance between the stated path probability and the recomputed product.
pub const PROBABILITY_TOLERANCE: f64 = 1e-5;

/// Options controlling which paths are kept while reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathFilter {
    /// Paths with a probability below this value are skipped
    pub cutoff: f64,
    /// Keep at most this many best-scoring paths (0 keeps all)
    pub max_paths: usize,
}

/// Read a path list, registering every interaction in `store`.
///
/// # Errors
///
/// Returns [`NeticError::ParseError`] for unreadable fields or unknown gene
/// names, and the fatal [`NeticError::DuplicatePath`] if a path id repeats.
pub fn read_path_list<P: AsRef<Path>>(
    path: P,
    genes: &GeneIdMap,
    store: &mut InteractionStore,
    filter: PathFilter,
) -> Result<BTreeMap<CircuitHeader, Vec<CandidatePath>>, NeticError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut grouped: BTreeMap<CircuitHeader, Vec<CandidatePath>> = BTreeMap::new();
    let mut seen = HashSet::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(candidate) = parse_path_line(&line, line_number, genes)? else {
            continue;
        };
        if candidate.probability < filter.cutoff {
            continue;
        }
        if !seen.insert(candidate.id) {
            tracing::error!(id = candidate.id, "duplicate path id");
            return Err(NeticError::DuplicatePath(candidate.id));
        }
        for &interaction in &candidate.interactions {
            store.add_interaction(interaction);
        }
        grouped
            .entry(CircuitHeader::new(
                candidate.start_condition.clone(),
                candidate.start_gene,
            ))
            .or_default()
            .push(candidate);
    }

    Ok(keep_best_paths(grouped, filter.max_paths))
}

/// Parse one path line. Lines with the wrong field count are logged and skipped.
pub fn parse_path_line(
    line: &str,
    id: usize,
    genes: &GeneIdMap,
) -> Result<Option<CandidatePath>, NeticError> {
    let mut fields: Vec<&str> = line.split('\t').collect();
    if fields.len() == 7 {
        fields.insert(1, fields[0]);
    }
    let [start, end, probability, steps, from_score, edge_scores, to_score, kinds] =
        fields.as_slice()
    else {
        tracing::error!(line, "invalid path format");
        return Ok(None);
    };

    let probability = parse_float(probability, line)?;
    let from_score = parse_float(from_score, line)?;
    let to_score = parse_float(to_score, line)?;
    let edge_scores = parse_list::<f64>(edge_scores, line)?;
    let kinds = parse_list::<InteractionTypeId>(kinds, line)?;

    let (gene_names, downstream) = split_steps(steps);
    if downstream.len() != edge_scores.len() || downstream.len() != kinds.len() {
        return Err(NeticError::ParseError(format!(
            "path has {} steps but {} edge scores and {} types: {line}",
            downstream.len(),
            edge_scores.len(),
            kinds.len()
        )));
    }
    let gene_ids = gene_names
        .iter()
        .map(|name| {
            genes.id(name).ok_or_else(|| {
                NeticError::ParseError(format!("gene {name} is not in the gene index"))
            })
        })
        .collect::<Result<Vec<GeneId>, _>>()?;

    let mut interactions = Vec::with_capacity(downstream.len());
    for (step, &is_downstream) in downstream.iter().enumerate() {
        let (from, to) = if is_downstream {
            (gene_ids[step], gene_ids[step + 1])
        } else {
            (gene_ids[step + 1], gene_ids[step])
        };
        interactions.push(InteractionId::new(from, to, kinds[step])?);
    }

    let recomputed = from_score * to_score * edge_scores.iter().product::<f64>();
    if (recomputed - probability).abs() > PROBABILITY_TOLERANCE {
        tracing::error!(
            line,
            expected = recomputed,
            actual = probability,
            "unexpected path probability"
        );
    }

    let start_gene = gene_ids[0];
    let end_gene = gene_ids[gene_ids.len() - 1];
    Ok(Some(CandidatePath::new(
        id,
        probability,
        interactions,
        edge_scores,
        (start_gene, (*start).to_string()),
        (end_gene, (*end).to_string()),
        from_score,
        to_score,
    )))
}

/// Split `A->B<-C` into gene names and per-step direction (`true` = downstream).
fn split_steps(text: &str) -> (Vec<&str>, Vec<bool>) {
    let mut genes = Vec::new();
    let mut downstream = Vec::new();
    let mut rest = text;
    loop {
        let next = [
            rest.find("->").map(|at| (at, true)),
            rest.find("<-").map(|at| (at, false)),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|(at, _)| *at);
        match next {
            Some((at, is_downstream)) => {
                genes.push(&rest[..at]);
                downstream.push(is_downstream);
                rest = &rest[at + 2..];
            }
            None => {
                genes.push(rest);
                break;
            }
        }
    }
    (genes, downstream)
}

fn parse_float(field: &str, line: &str) -> Result<f64, NeticError> {
    field
        .trim()
        .parse()
        .map_err(|_| NeticError::ParseError(format!("invalid number '{field}' in path: {line}")))
}

fn parse_list<T: std::str::FromStr>(field: &str, line: &str) -> Result<Vec<T>, NeticError> {
    let inner = field
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| NeticError::ParseError(format!("expected [..] list in path: {line}")))?;
    inner
        .split_whitespace()
        .map(|value| {
            value.parse().map_err(|_| {
                NeticError::ParseError(format!("invalid list value '{value}' in path: {line}"))
            })
        })
        .collect()
}

/// Drop every path not strictly better than the `(max_paths + 1)`-th best.
fn keep_best_paths(
    mut grouped: BTreeMap<CircuitHeader, Vec<CandidatePath>>,
    max_paths: usize,
) -> BTreeMap<CircuitHeader, Vec<CandidatePath>> {
    let mut scores: Vec<f64> = grouped
        .values()
        .flatten()
        .map(|path| path.probability)
        .collect();
    if max_paths == 0 || max_paths >= scores.len() {
        return grouped;
    }
    let (_, cutoff, _) = scores.select_nth_unstable_by(max_paths, |a, b| b.total_cmp(a));
    let cutoff = *cutoff;
    if cutoff <= 0.0 {
        return grouped;
    }
    for paths in grouped.values_mut() {
        paths.retain(|path| path.probability > cutoff);
    }
    grouped.retain(|_, paths| !paths.is_empty());
    let kept: usize = grouped.values().map(Vec::len).sum();
    tracing::info!(kept, cutoff, "filtered path counts");
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn genes() -> GeneIdMap {
        let mut genes = GeneIdMap::new();
        for name in ["A", "B", "C", "D"] {
            genes.register(name).unwrap();
        }
        genes
    }

    #[test]
    fn test_split_steps() {
        let (genes, downstream) = split_steps("A->B<-C");
        assert_eq!(genes, vec!["A", "B", "C"]);
        assert_eq!(downstream, vec![true, false]);

        let (genes, downstream) = split_steps("single");
        assert_eq!(genes, vec!["single"]);
        assert!(downstream.is_empty());
    }

    #[test]
    fn test_parse_line_with_end_condition() {
        let line = "s1\ts2\t0.24\tA->B<-C\t1\t[0.6 0.4]\t1\t[1 2]";
        let path = parse_path_line(line, 4, &genes()).unwrap().unwrap();

        assert_eq!(path.id, 4);
        assert_eq!(path.start_condition, "s1");
        assert_eq!(path.end_condition, "s2");
        assert_eq!((path.start_gene, path.end_gene), (1, 3));
        assert_eq!(
            path.interactions,
            vec![
                InteractionId::new(1, 2, 1).unwrap(),
                InteractionId::new(3, 2, 2).unwrap()
            ]
        );
    }

    #[test]
    fn test_parse_line_without_end_condition() {
        let line = "s1\t0.5\tA->B\t1\t[0.5]\t1\t[1]";
        let path = parse_path_line(line, 0, &genes()).unwrap().unwrap();
        assert_eq!(path.end_condition, "s1");
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_path_line("too\tshort", 0, &genes()).unwrap().is_none());
        let unknown = "s1\t0.5\tA->Z\t1\t[0.5]\t1\t[1]";
        assert!(parse_path_line(unknown, 0, &genes()).is_err());
        let mismatched = "s1\t0.5\tA->B\t1\t[0.5 0.5]\t1\t[1]";
        assert!(parse_path_line(mismatched, 0, &genes()).is_err());
    }

    #[test]
    fn test_read_path_list_filters() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("paths.txt");
        fs::write(
            &file,
            "s1\t0.9\tA->B\t1\t[0.9]\t1\t[1]\n\
             s1\t0.5\tA->C\t1\t[0.5]\t1\t[1]\n\
             s2\t0.1\tB->D\t1\t[0.1]\t1\t[1]\n\
             s2\t0.7\tB->C\t1\t[0.7]\t1\t[1]\n",
        )
        .unwrap();

        let mut store = InteractionStore::default();
        let all = read_path_list(&file, &genes(), &mut store, PathFilter::default()).unwrap();
        assert_eq!(all.values().map(Vec::len).sum::<usize>(), 4);
        assert_eq!(store.interaction_count(), 4);

        let cut = read_path_list(
            &file,
            &genes(),
            &mut InteractionStore::default(),
            PathFilter {
                cutoff: 0.2,
                max_paths: 0,
            },
        )
        .unwrap();
        assert_eq!(cut.values().map(Vec::len).sum::<usize>(), 3);

        let best = read_path_list(
            &file,
            &genes(),
            &mut InteractionStore::default(),
            PathFilter {
                cutoff: 0.0,
                max_paths: 2,
            },
        )
        .unwrap();
        let kept: Vec<usize> = best.values().flatten().map(|p| p.id).collect();
        assert_eq!(kept, vec![0, 3]);
    }
}
