//! Result files of an optimization run.
//!
//! Every distinct subnetwork of the final population is written to
//! `<dir>/size_<n>/result-<k>.network`, where `k` counts networks of the
//! same size from 1:
//!
//! ```text
//! % score [0.25 0.63 1.7]
//! % ppi non-regulatory
//! % kinase regulatory
//! 1;2;1
//! 2;3;2
//! ```
//!
//! The score line is followed by one annotation line per interaction type
//! and the network's interactions, sorted.
//!
//! ## Examples
//!
//! ```rust
//! use netic_core::interaction_store::InteractionStore;
//! use netic_core::output::write_network;
//! use netic_core::subnetwork::Subnetwork;
//!
//! let mut buffer = Vec::new();
//! write_network(&mut buffer, &Subnetwork::new(), &InteractionStore::default())?;
//! assert_eq!(String::from_utf8(buffer).unwrap(), "% score []\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::interaction_store::InteractionStore;
use crate::subnetwork::Subnetwork;
use crate::types::{format_scores, NeticError};

/// Write one subnetwork in results-file format.
pub fn write_network<W: Write>(
    writer: &mut W,
    network: &Subnetwork,
    store: &InteractionStore,
) -> std::io::Result<()> {
    writeln!(writer, "% score {}", format_scores(network.scores()))?;
    for line in store.interaction_type_lines() {
        writeln!(writer, "{line}")?;
    }
    let mut interactions: Vec<String> = network
        .interactions()
        .iter()
        .map(ToString::to_string)
        .collect();
    interactions.sort();
    for interaction in interactions {
        writeln!(writer, "{interaction}")?;
    }
    Ok(())
}

/// Write every distinct network of `networks` below `dir`.
///
/// Networks with the interaction set of an earlier one are skipped.
/// Returns the written files in order.
pub fn write_results(
    dir: &Path,
    networks: &[Subnetwork],
    store: &InteractionStore,
) -> Result<Vec<PathBuf>, NeticError> {
    let mut written: Vec<&Subnetwork> = Vec::with_capacity(networks.len());
    let mut per_size: BTreeMap<usize, usize> = BTreeMap::new();
    let mut files = Vec::with_capacity(networks.len());

    for network in networks {
        if written.iter().any(|other| other.is_duplicate_of(network)) {
            continue;
        }
        written.push(network);

        let index = per_size.entry(network.size()).or_insert(0);
        *index += 1;
        let size_dir = dir.join(format!("size_{}", network.size()));
        fs::create_dir_all(&size_dir).map_err(|err| NeticError::output_write(&size_dir, err))?;

        let file = size_dir.join(format!("result-{index}.network"));
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(&file)?);
            write_network(&mut writer, network, store)?;
            writer.flush()
        };
        write().map_err(|err| NeticError::output_write(&file, err))?;
        files.push(file);
    }

    tracing::info!(
        dir = %dir.display(),
        networks = files.len(),
        duplicates = networks.len() - files.len(),
        "wrote result networks"
    );
    Ok(files)
}

/// Append a run time in seconds to `file`.
pub fn append_run_time(file: &Path, seconds: f64) -> Result<(), NeticError> {
    let append = || -> std::io::Result<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = OpenOptions::new().create(true).append(true).open(file)?;
        writeln!(out, "{seconds:.6}")
    };
    append().map_err(|err| NeticError::output_write(file, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction_store::InteractionTypeMap;
    use crate::path::PathId;
    use crate::types::{InteractionId, InteractionSet};
    use tempfile::tempdir;

    fn store() -> InteractionStore {
        let mut types = InteractionTypeMap::new();
        types.register("ppi").unwrap();
        types.register("kinase").unwrap();
        let mut store = InteractionStore::new(types);
        store.set_regulatory("kinase").unwrap();
        store
    }

    fn network(edges: &[(u32, u32, u8)], scores: Vec<f64>) -> Subnetwork {
        let set: InteractionSet = edges
            .iter()
            .map(|&(from, to, kind)| InteractionId::new(from, to, kind).unwrap())
            .collect();
        let mut network = Subnetwork::new();
        network.add_path(PathId::new(0, 0, edges.len()).unwrap(), &set);
        network.set_scores(scores);
        network
    }

    #[test]
    fn test_network_file_format() {
        let mut buffer = Vec::new();
        let network = network(&[(12, 3, 2), (1, 2, 1)], vec![0.5, 0.25, 1.75]);
        write_network(&mut buffer, &network, &store()).unwrap();
        insta::assert_snapshot!(String::from_utf8(buffer).unwrap(), @r"
        % score [0.5 0.25 1.75]
        % ppi non-regulatory
        % kinase regulatory
        1;2;1
        12;3;2
        ");
    }

    #[test]
    fn test_results_skip_duplicates_and_count_per_size() {
        let dir = tempdir().unwrap();
        let networks = vec![
            network(&[(1, 2, 1), (2, 3, 1)], vec![0.5]),
            network(&[(2, 3, 1), (1, 2, 1)], vec![0.5]),
            network(&[(4, 5, 1), (5, 6, 1)], vec![0.5]),
            network(&[(7, 8, 2)], vec![1.0]),
        ];
        let files = write_results(dir.path(), &networks, &store()).unwrap();

        let relative: Vec<PathBuf> = files
            .iter()
            .map(|file| file.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("size_2/result-1.network"),
                PathBuf::from("size_2/result-2.network"),
                PathBuf::from("size_1/result-1.network"),
            ]
        );
    }

    #[test]
    fn test_run_time_is_appended() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("MO").join("runTime");
        append_run_time(&file, 1.5).unwrap();
        append_run_time(&file, 0.25).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "1.500000\n0.250000\n");
    }
}
