//! Diversity scores over per-condition explained-circuit counts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::circuit::Circuit;
use crate::subnetwork::Subnetwork;
use crate::types::NeticError;

/// How the distribution of explained conditions is turned into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Shannon entropy normalised by `log2(#conditions)`
    #[default]
    Entropy,
    /// Inverse Simpson index normalised by the number of conditions
    Effective,
}

impl FromStr for SampleMode {
    type Err = NeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "entropy" => Ok(Self::Entropy),
            "effective" => Ok(Self::Effective),
            other => Err(NeticError::ConfigError(format!(
                "unknown sample objective type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entropy => "entropy",
            Self::Effective => "effective",
        })
    }
}

impl SampleMode {
    #[must_use]
    pub fn score(self, counts: &[usize]) -> f64 {
        match self {
            Self::Entropy => entropy_score(counts),
            Self::Effective => effective_sample_score(counts),
        }
    }
}

/// Number of circuits with a positive evaluation, per condition.
///
/// Every condition that has a circuit appears, with a zero count if none of
/// its circuits is explained.
#[must_use]
pub fn explained_counts(network: &Subnetwork, circuits: &[Circuit]) -> Vec<usize> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for circuit in circuits {
        let count = counts.entry(circuit.condition()).or_insert(0);
        if circuit.evaluate(&network.intersect(circuit)) > 0.0 {
            *count += 1;
        }
    }
    counts.into_values().collect()
}

/// Normalised Shannon entropy. 0 when at most one condition is explained.
#[must_use]
pub fn entropy_score(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    let mut nonzero = 0;
    for &count in counts.iter().filter(|&&count| count > 0) {
        let p = count as f64 / total as f64;
        entropy -= p * p.log2();
        nonzero += 1;
    }
    if nonzero <= 1 {
        return 0.0;
    }
    entropy / (counts.len() as f64).log2()
}

/// Effective number of conditions (`1 / Σp²`) over the number of conditions.
#[must_use]
pub fn effective_sample_score(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let sum_squares: f64 = counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total as f64;
            p * p
        })
        .sum();
    if sum_squares == 0.0 {
        return 0.0;
    }
    (1.0 / sum_squares) / counts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_score() {
        assert_eq!(entropy_score(&[]), 0.0);
        assert_eq!(entropy_score(&[0, 0, 0]), 0.0);
        assert_eq!(entropy_score(&[5, 0, 0]), 0.0);
        assert!((entropy_score(&[2, 2]) - 1.0).abs() < 1e-12);
        assert!((entropy_score(&[3, 3, 3, 3]) - 1.0).abs() < 1e-12);

        // two of four conditions equally explained: H = 1 bit, max = 2 bits
        assert!((entropy_score(&[1, 1, 0, 0]) - 0.5).abs() < 1e-12);
        assert!(entropy_score(&[9, 1]) < entropy_score(&[5, 5]));
    }

    #[test]
    fn test_effective_sample_score() {
        assert_eq!(effective_sample_score(&[0, 0]), 0.0);
        assert!((effective_sample_score(&[4, 4, 4, 4]) - 1.0).abs() < 1e-12);
        assert!((effective_sample_score(&[7, 0, 0, 0]) - 0.25).abs() < 1e-12);
        assert!((effective_sample_score(&[1, 1, 0, 0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_mode_parse() {
        assert_eq!("entropy".parse::<SampleMode>().unwrap(), SampleMode::Entropy);
        assert_eq!("".parse::<SampleMode>().unwrap(), SampleMode::Entropy);
        assert_eq!("effective".parse::<SampleMode>().unwrap(), SampleMode::Effective);
        assert!("simpson".parse::<SampleMode>().is_err());
        assert_eq!(SampleMode::Effective.to_string(), "effective");
    }
}
