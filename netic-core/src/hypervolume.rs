//! Hypervolume of a Pareto front against the origin.
//!
//! All objectives are maximised, so a front's hypervolume is the volume of
//! the union of the boxes spanned by the origin and each point. It is
//! computed either in-process or by an external WFG binary (`wfg2` for two
//! objectives, `wfg0` otherwise) that reads a `.fronts` file and prints
//! `... = <volume>`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::NeticError;

#[derive(Debug, Clone)]
pub struct HypervolumeCalculator {
    tools: Option<PathBuf>,
    fronts_dir: PathBuf,
}

impl HypervolumeCalculator {
    /// `tools` is the directory of the WFG binaries; `None` computes
    /// hypervolumes in-process.
    pub fn new(tools: Option<PathBuf>, fronts_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            fronts_dir: fronts_dir.into(),
        }
    }

    /// Hypervolume of `front`, labelled `name` in tool input files.
    ///
    /// Tool failures are logged and yield 0.
    pub fn calculate(&self, name: &str, front: &[Vec<f64>]) -> f64 {
        let points = unique_points(front);
        let Some(tools) = &self.tools else {
            return exact_hypervolume(&points);
        };
        match self.run_tool(tools, name, &points) {
            Ok(hypervolume) => {
                tracing::debug!(front = front.len(), points = points.len(), hypervolume, "front hypervolume");
                hypervolume
            }
            Err(err) => {
                tracing::error!(front = name, error = %err, "failed to compute hypervolume");
                0.0
            }
        }
    }

    fn run_tool(&self, tools: &Path, name: &str, points: &[Vec<f64>]) -> Result<f64, NeticError> {
        let dimensions = points.first().map_or(0, Vec::len);
        let tool = tools.join(if dimensions == 2 { "wfg2" } else { "wfg0" });
        let input = write_front_file(&self.fronts_dir, name, points)?;

        let output = Command::new(&tool).arg(&input).output()?;
        let result_file = input.with_extension("hv");
        fs::write(&result_file, &output.stdout)
            .map_err(|err| NeticError::output_write(&result_file, err))?;
        if !output.status.success() {
            return Err(NeticError::ParseError(format!(
                "{} exited with {}",
                tool.display(),
                output.status
            )));
        }
        parse_tool_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Drop repeated points, keeping first occurrences.
#[must_use]
pub fn unique_points(front: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut seen = HashSet::new();
    front
        .iter()
        .filter(|point| seen.insert(point.iter().map(|value| value.to_bits()).collect::<Vec<_>>()))
        .cloned()
        .collect()
}

/// Write `points` as `<dir>/<name>.fronts`, one sorted line per point between
/// `#` markers. An existing file is left alone and `<name>-<k>.fronts` is
/// used instead.
pub fn write_front_file(dir: &Path, name: &str, points: &[Vec<f64>]) -> Result<PathBuf, NeticError> {
    fs::create_dir_all(dir).map_err(|err| NeticError::output_write(dir, err))?;
    let mut file = dir.join(format!("{name}.fronts"));
    let mut index = 0;
    while file.exists() {
        tracing::info!(file = %file.display(), "front file already exists");
        index += 1;
        file = dir.join(format!("{name}-{index}.fronts"));
    }

    let mut lines: Vec<String> = points
        .iter()
        .map(|point| {
            point
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    lines.sort();

    let write = || -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&file)?);
        writeln!(writer, "#")?;
        for line in &lines {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer, "#")?;
        writer.flush()
    };
    write().map_err(|err| NeticError::output_write(&file, err))?;
    Ok(file)
}

/// Read the volume from the first `<label> = <value>` line.
pub fn parse_tool_output(output: &str) -> Result<f64, NeticError> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split(" = ").collect();
        if let [_, value] = parts.as_slice() {
            return value.trim().parse().map_err(|_| {
                NeticError::ParseError(format!("invalid hypervolume value: {line}"))
            });
        }
    }
    Err(NeticError::ParseError("no hypervolume in tool output".into()))
}

/// Exact hypervolume using WFG exclusive volumes.
///
/// Points with a non-positive or non-finite coordinate span no volume.
#[must_use]
pub fn exact_hypervolume(points: &[Vec<f64>]) -> f64 {
    let valid: Vec<Vec<f64>> = points
        .iter()
        .filter(|point| !point.is_empty())
        .filter(|point| point.iter().all(|&value| value > 0.0 && value.is_finite()))
        .cloned()
        .collect();
    let Some(dimensions) = valid.first().map(Vec::len) else {
        return 0.0;
    };
    let valid = valid.into_iter().filter(|point| point.len() == dimensions).collect();
    wfg(non_dominated(valid))
}

/// Hypervolume of a mutually non-dominated set.
fn wfg(mut front: Vec<Vec<f64>>) -> f64 {
    match front.first().map(Vec::len) {
        None => 0.0,
        Some(1) => front.iter().map(|point| point[0]).fold(0.0, f64::max),
        Some(2) => sweep_2d(front),
        Some(dimensions) => {
            let last = dimensions - 1;
            front.sort_by(|a, b| b[last].total_cmp(&a[last]));
            (0..front.len())
                .map(|i| exclusive_volume(&front[i], &front[i + 1..]))
                .sum()
        }
    }
}

/// Volume dominated by `point` and by nothing in `rest`.
fn exclusive_volume(point: &[f64], rest: &[Vec<f64>]) -> f64 {
    let limited: Vec<Vec<f64>> = rest
        .iter()
        .map(|other| other.iter().zip(point).map(|(a, b)| a.min(*b)).collect())
        .collect();
    point.iter().product::<f64>() - wfg(non_dominated(limited))
}

/// Two objectives: one pass in decreasing order of the first.
fn sweep_2d(mut front: Vec<Vec<f64>>) -> f64 {
    front.sort_by(|a, b| b[0].total_cmp(&a[0]));
    let mut height = 0.0;
    let mut volume = 0.0;
    for point in &front {
        if point[1] > height {
            volume += point[0] * (point[1] - height);
            height = point[1];
        }
    }
    volume
}

/// Keep one copy of every point not weakly dominated by another.
fn non_dominated(mut points: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    // a dominating point sorts before everything it dominates
    points.sort_by(|a, b| {
        b.iter()
            .zip(a)
            .map(|(x, y)| x.total_cmp(y))
            .find(|order| order.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    let mut front: Vec<Vec<f64>> = Vec::with_capacity(points.len());
    for point in points {
        let covered = front
            .iter()
            .any(|kept| kept.iter().zip(&point).all(|(a, b)| a >= b));
        if !covered {
            front.push(point);
        }
    }
    front
}
