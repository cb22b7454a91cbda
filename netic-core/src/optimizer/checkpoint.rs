//! Population checkpoints and the hypervolume history.
//!
//! A checkpoint is named after its generation (`<t>` or `best_<t>`) and
//! holds one [`Subnetwork`] line per member, sorted. Only the most recent
//! regular checkpoints are kept; best checkpoints are never removed.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::path::PathRepositories;
use crate::subnetwork::Subnetwork;
use crate::types::NeticError;

/// Prefix of checkpoints holding the best population so far.
pub const BEST_PREFIX: &str = "best_";

/// Regular checkpoints kept on disk, the newest one included.
const KEEP_RECENT: usize = 3;

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn file(&self, prefix: &str, generation: usize) -> PathBuf {
        self.dir.join(format!("{prefix}{generation}"))
    }

    /// Write `population` as checkpoint `<prefix><generation>`.
    ///
    /// Existing checkpoints are never overwritten; returns `false` when the
    /// file was already there.
    pub fn write_population(
        &self,
        prefix: &str,
        generation: usize,
        population: &[Subnetwork],
    ) -> Result<bool, NeticError> {
        let file = self.file(prefix, generation);
        if file.exists() {
            tracing::info!(file = %file.display(), "checkpoint already exists");
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|err| NeticError::output_write(&self.dir, err))?;

        let mut lines: Vec<String> = population.iter().map(ToString::to_string).collect();
        lines.sort();
        write_lines(&file, &lines)?;

        if prefix.is_empty() {
            self.remove_old(generation);
        }
        Ok(true)
    }

    /// Remove regular checkpoints older than `current` beyond the most recent few.
    fn remove_old(&self, current: usize) {
        let mut older: Vec<(usize, PathBuf)> = self
            .numbered_files("")
            .into_iter()
            .filter(|(generation, _)| *generation < current)
            .collect();
        older.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, file) in older.into_iter().skip(KEEP_RECENT - 1) {
            match fs::remove_file(&file) {
                Ok(()) => tracing::debug!(file = %file.display(), "removed old checkpoint"),
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "failed to remove old checkpoint");
                }
            }
        }
    }

    fn numbered_files(&self, prefix: &str) -> Vec<(usize, PathBuf)> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name();
                let generation = name.to_str()?.strip_prefix(prefix)?.parse().ok()?;
                Some((generation, entry.path()))
            })
            .collect()
    }

    /// Highest-numbered checkpoint with `prefix`.
    #[must_use]
    pub fn highest(&self, prefix: &str) -> Option<(usize, PathBuf)> {
        self.numbered_files(prefix)
            .into_iter()
            .max_by_key(|(generation, _)| *generation)
    }

    /// Checkpoint to resume from: the latest regular one, else the latest best one.
    #[must_use]
    pub fn latest(&self) -> Option<(usize, PathBuf)> {
        self.highest("").or_else(|| self.highest(BEST_PREFIX))
    }

    /// Read a checkpoint, re-deriving path interactions from `repositories`.
    ///
    /// # Errors
    ///
    /// Any malformed line is a [`NeticError::CorruptCheckpoint`].
    pub fn read_population(
        &self,
        file: &Path,
        repositories: &PathRepositories,
    ) -> Result<Vec<Subnetwork>, NeticError> {
        tracing::info!(file = %file.display(), "reading population");
        let reader = BufReader::new(File::open(file)?);
        let mut population = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let network = Subnetwork::parse_checkpoint(&line, repositories).map_err(|reason| {
                NeticError::CorruptCheckpoint {
                    file: file.to_path_buf(),
                    line: index + 1,
                    reason,
                }
            })?;
            population.push(network);
        }
        Ok(population)
    }
}

/// Write the hypervolume history, one value per line.
pub fn write_hypervolumes(file: &Path, hypervolumes: &[f64]) -> Result<(), NeticError> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|err| NeticError::output_write(parent, err))?;
    }
    let lines: Vec<String> = hypervolumes.iter().map(ToString::to_string).collect();
    write_lines(file, &lines)
}

/// Read a hypervolume history. A missing file is an empty history and
/// unreadable values count as 0.
pub fn read_hypervolumes(file: &Path) -> Result<Vec<f64>, NeticError> {
    if !file.exists() {
        tracing::warn!(file = %file.display(), "no hypervolume history found");
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(file)?);
    let mut hypervolumes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        hypervolumes.push(line.parse().unwrap_or_else(|_| {
            tracing::warn!(value = line, "unreadable hypervolume");
            0.0
        }));
    }
    Ok(hypervolumes)
}

fn write_lines(file: &Path, lines: &[String]) -> Result<(), NeticError> {
    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(file)?);
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()
    };
    write().map_err(|err| NeticError::output_write(file, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::test_support::path;
    use crate::path::{CircuitHeader, PathId, PathRepository};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn repositories() -> PathRepositories {
        let mut grouped: BTreeMap<CircuitHeader, Vec<_>> = BTreeMap::new();
        grouped.insert(
            CircuitHeader::new("s1", 1),
            vec![path(0, "s1", &[(1, 2), (2, 3)]), path(1, "s1", &[(3, 4)])],
        );
        let mut repositories = PathRepositories::new();
        repositories.add(PathRepository::new("mutation", grouped));
        repositories
    }

    fn population(repositories: &PathRepositories) -> Vec<Subnetwork> {
        (0..2)
            .map(|index| {
                let id = PathId::new(0, 0, index).unwrap();
                let mut network = Subnetwork::new();
                network.add_path(id, repositories.path_interaction_set(id).unwrap());
                network.set_scores(vec![index as f64, 1.0]);
                network
            })
            .collect()
    }

    #[test]
    fn test_population_round_trip() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("population"));
        let repositories = repositories();
        let population = population(&repositories);

        assert!(store.write_population("", 0, &population).unwrap());
        let restored = store
            .read_population(&store.file("", 0), &repositories)
            .unwrap();
        let mut expected: Vec<String> = population.iter().map(ToString::to_string).collect();
        expected.sort();
        let restored: Vec<String> = restored.iter().map(ToString::to_string).collect();
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_existing_checkpoint_is_kept() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let repositories = repositories();
        let population = population(&repositories);

        assert!(store.write_population(BEST_PREFIX, 4, &population).unwrap());
        let before = fs::read_to_string(store.file(BEST_PREFIX, 4)).unwrap();
        assert!(!store.write_population(BEST_PREFIX, 4, &population[..1]).unwrap());
        assert_eq!(fs::read_to_string(store.file(BEST_PREFIX, 4)).unwrap(), before);
    }

    #[test]
    fn test_retention_and_latest() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let repositories = repositories();
        let population = population(&repositories);

        for generation in 0..7 {
            store.write_population("", generation, &population).unwrap();
        }
        store.write_population(BEST_PREFIX, 1, &population).unwrap();
        store.write_population(BEST_PREFIX, 2, &population).unwrap();

        let mut regular: Vec<usize> = store.numbered_files("").into_iter().map(|(t, _)| t).collect();
        regular.sort_unstable();
        assert_eq!(regular, vec![4, 5, 6]);
        assert_eq!(store.highest(BEST_PREFIX).map(|(t, _)| t), Some(2));
        assert_eq!(store.latest().map(|(t, _)| t), Some(6));
    }

    #[test]
    fn test_latest_falls_back_to_best() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(store.latest().is_none());

        let repositories = repositories();
        store
            .write_population(BEST_PREFIX, 9, &population(&repositories))
            .unwrap();
        assert_eq!(store.latest().map(|(t, _)| t), Some(9));
    }

    #[test]
    fn test_corrupt_checkpoint_is_fatal() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let file = store.file("", 0);
        fs::write(&file, "1;2;1\t0\t[1]\nnot a checkpoint line\n").unwrap();

        let err = store.read_population(&file, &repositories()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, NeticError::CorruptCheckpoint { line: 2, .. }));
    }

    #[test]
    fn test_hypervolume_history() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("MO").join("hyperVolumes");
        assert!(read_hypervolumes(&file).unwrap().is_empty());

        write_hypervolumes(&file, &[0.0, 0.25, 1.5]).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "0\n0.25\n1.5\n");
        assert_eq!(read_hypervolumes(&file).unwrap(), vec![0.0, 0.25, 1.5]);
    }
}
