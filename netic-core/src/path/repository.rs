use std::collections::BTreeMap;
use std::time::Instant;

use rand::Rng;

use super::{CandidatePath, CircuitHeader, PathId};
use crate::types::{Condition, InteractionSet, NeticError};

/// All paths of one path type, partitioned by start condition.
///
/// Samples are kept in ascending condition order and each sample's paths in
/// [`CandidatePath::repository_order`], which makes [`PathId`]s stable.
#[derive(Debug, Clone)]
pub struct PathRepository {
    path_type: String,
    samples: Vec<Condition>,
    paths: Vec<Vec<CandidatePath>>,
    number_of_paths: usize,
}

impl PathRepository {
    /// Build a repository from paths grouped per circuit header.
    #[must_use]
    pub fn new(path_type: &str, grouped: BTreeMap<CircuitHeader, Vec<CandidatePath>>) -> Self {
        let mut per_sample: BTreeMap<Condition, Vec<CandidatePath>> = BTreeMap::new();
        for path in grouped.into_values().flatten() {
            per_sample
                .entry(path.start_condition.clone())
                .or_default()
                .push(path);
        }

        let started = Instant::now();
        let mut samples = Vec::with_capacity(per_sample.len());
        let mut paths = Vec::with_capacity(per_sample.len());
        let mut number_of_paths = 0;
        for (sample, mut sample_paths) in per_sample {
            sample_paths.sort_by(CandidatePath::repository_order);
            number_of_paths += sample_paths.len();
            samples.push(sample);
            paths.push(sample_paths);
        }
        tracing::info!(
            path_type,
            samples = samples.len(),
            paths = number_of_paths,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sorted all paths"
        );

        Self {
            path_type: path_type.to_string(),
            samples,
            paths,
            number_of_paths,
        }
    }

    #[must_use]
    pub fn path_type(&self) -> &str {
        &self.path_type
    }

    #[must_use]
    pub fn number_of_paths(&self) -> usize {
        self.number_of_paths
    }

    #[must_use]
    pub fn samples(&self) -> &[Condition] {
        &self.samples
    }

    /// Paths of the sample at `sample` index.
    #[must_use]
    pub fn sample_paths(&self, sample: usize) -> &[CandidatePath] {
        self.paths.get(sample).map_or(&[], Vec::as_slice)
    }

    /// Uniformly random sample index, `None` for an empty repository.
    pub fn random_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        (!self.paths.is_empty()).then(|| rng.gen_range(0..self.paths.len()))
    }

    /// Uniformly random path index within `sample`.
    pub fn random_path<R: Rng + ?Sized>(&self, sample: usize, rng: &mut R) -> Option<usize> {
        let paths = self.sample_paths(sample);
        (!paths.is_empty()).then(|| rng.gen_range(0..paths.len()))
    }

    #[must_use]
    pub fn path(&self, sample: usize, path: usize) -> Option<&CandidatePath> {
        self.paths.get(sample)?.get(path)
    }
}

/// One [`PathRepository`] per path type, indexed by [`PathId::path_type`].
#[derive(Debug, Clone, Default)]
pub struct PathRepositories {
    repositories: Vec<PathRepository>,
}

impl PathRepositories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, repository: PathRepository) {
        self.repositories.push(repository);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathRepository> {
        self.repositories.iter()
    }

    /// Total number of paths over all path types.
    #[must_use]
    pub fn number_of_paths(&self) -> usize {
        self.repositories
            .iter()
            .map(PathRepository::number_of_paths)
            .sum()
    }

    /// Uniformly random repository and its index.
    pub fn random_repository<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<(usize, &PathRepository)> {
        if self.repositories.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.repositories.len());
        Some((index, &self.repositories[index]))
    }

    /// Draw a `(repository, sample, path)` triple, each level uniform.
    ///
    /// Returns `None` when the drawn repository or sample holds no paths.
    pub fn random_path_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PathId> {
        let (path_type, repository) = self.random_repository(rng)?;
        let sample = repository.random_sample(rng)?;
        let path = repository.random_path(sample, rng)?;
        PathId::new(path_type, sample, path).ok()
    }

    #[must_use]
    pub fn path(&self, id: PathId) -> Option<&CandidatePath> {
        self.repositories
            .get(id.path_type())?
            .path(id.sample(), id.path())
    }

    /// Interaction set of the path behind `id`.
    pub fn path_interaction_set(&self, id: PathId) -> Result<&InteractionSet, NeticError> {
        self.path(id)
            .map(CandidatePath::interaction_set)
            .ok_or_else(|| {
                NeticError::InvalidIdentifier(format!(
                    "path id {id} (type {}, sample {}, path {}) is not in the repository",
                    id.path_type(),
                    id.sample(),
                    id.path()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::test_support::path;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grouped(paths: Vec<CandidatePath>) -> BTreeMap<CircuitHeader, Vec<CandidatePath>> {
        let mut grouped: BTreeMap<CircuitHeader, Vec<CandidatePath>> = BTreeMap::new();
        for path in paths {
            grouped
                .entry(CircuitHeader::new(path.start_condition.clone(), path.start_gene))
                .or_default()
                .push(path);
        }
        grouped
    }

    #[test]
    fn test_repository_partitions_and_sorts() {
        let repository = PathRepository::new(
            "mutation",
            grouped(vec![
                path(0, "s2", &[(1, 2), (2, 3)]),
                path(1, "s1", &[(4, 5), (5, 6)]),
                path(2, "s1", &[(7, 8)]),
                path(3, "s1", &[(1, 2), (2, 9)]),
            ]),
        );

        assert_eq!(repository.number_of_paths(), 4);
        assert_eq!(repository.samples(), ["s1".to_string(), "s2".to_string()]);
        let ids: Vec<usize> = repository.sample_paths(0).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(repository.sample_paths(1)[0].id, 0);
        assert!(repository.sample_paths(5).is_empty());
    }

    #[test]
    fn test_repositories_dereference() {
        let mut repositories = PathRepositories::new();
        repositories.add(PathRepository::new(
            "mutation",
            grouped(vec![path(0, "s1", &[(1, 2)])]),
        ));
        repositories.add(PathRepository::new(
            "expression",
            grouped(vec![path(0, "s1", &[(3, 4)]), path(1, "s1", &[(3, 5), (5, 6)])]),
        ));
        assert_eq!(repositories.number_of_paths(), 3);

        let id = PathId::new(1, 0, 1).unwrap();
        let set = repositories.path_interaction_set(id).unwrap();
        assert_eq!(set.len(), 2);

        let missing = PathId::new(1, 0, 2).unwrap();
        assert!(repositories.path_interaction_set(missing).is_err());
        assert!(repositories
            .path_interaction_set(PathId::new(7, 0, 0).unwrap())
            .is_err());
    }

    #[test]
    fn test_random_path_id_is_valid_and_seeded() {
        let mut repositories = PathRepositories::new();
        repositories.add(PathRepository::new(
            "mutation",
            grouped(vec![
                path(0, "s1", &[(1, 2)]),
                path(1, "s2", &[(2, 3)]),
                path(2, "s2", &[(3, 4)]),
            ]),
        ));

        let mut first = ChaCha8Rng::seed_from_u64(7);
        let mut second = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let id = repositories.random_path_id(&mut first).unwrap();
            assert!(repositories.path(id).is_some());
            assert_eq!(Some(id), repositories.random_path_id(&mut second));
        }
    }

    #[test]
    fn test_empty_repositories() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut repositories = PathRepositories::new();
        assert!(repositories.random_path_id(&mut rng).is_none());
        repositories.add(PathRepository::new("mutation", BTreeMap::new()));
        assert!(repositories.random_path_id(&mut rng).is_none());
        assert_eq!(repositories.number_of_paths(), 0);
    }
}
