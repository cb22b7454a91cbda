//! # Netic CLI - Subnetwork Optimizer
//!
//! Command-line front-end for the netic NSGA-II search over gene interaction
//! subnetworks. Reads the gene index, path lists and compiled circuits from
//! earlier pipeline stages and writes Pareto-optimal networks.
//!
//! ## Usage
//!
//! ```bash
//! # Optimize over mutation paths found in ./run1
//! netic -o run1
//!
//! # Two path types, a fixed budget and a reproducible seed
//! netic -o run1 --path-types mutation,expression --generations-count 200 --seed 7
//!
//! # Continue an interrupted run
//! netic -o run1 --resume
//!
//! # Reuse artifacts from another run
//! netic -o run2 --use-index run1 --use-paths run1/paths_4 --use-nnfs run1/NF_4
//! ```
//!
//! ## Output
//!
//! - `<output>/optimization_<population>/size_<n>/result-<k>.network`: result networks
//! - `<output>/MO/population/`: checkpoints, one per generation
//! - `<output>/MO/hyperVolumes`: hypervolume history
//! - `<output>/MO/runTime`: run time in seconds, one line per run
//!
//! ## Logging
//!
//! Logs go to stderr (or `--log-file`) as text or JSON. `RUST_LOG` overrides
//! the default `info` level unless `--verbose` or `--quiet` is given.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use netic_core::config::{ArtifactPaths, OptimizerConfig};
use netic_core::objective::SampleMode;
use netic_core::MultiObjectiveRunner;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("netic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Pareto-optimal gene interaction subnetworks")
        .arg(
            Arg::new("output-folder")
                .short('o')
                .long("output-folder")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Folder for checkpoints and results"),
        )
        .arg(
            Arg::new("use-index")
                .long("use-index")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Folder with precomputed gene-ids and interaction-type-ids"),
        )
        .arg(
            Arg::new("use-paths")
                .long("use-paths")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Folder with precomputed paths, one sub-folder per path type"),
        )
        .arg(
            Arg::new("use-nnfs")
                .long("use-nnfs")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Folder with precomputed circuits, one sub-folder per path type"),
        )
        .arg(
            Arg::new("regulatory-types")
                .long("regulatory-types")
                .value_name("TYPES")
                .value_delimiter(',')
                .help("Comma-separated regulatory interaction types"),
        )
        .arg(
            Arg::new("path-types")
                .long("path-types")
                .value_name("TYPES")
                .value_delimiter(',')
                .default_value("mutation")
                .help("Comma-separated path types to optimize over"),
        )
        .arg(
            Arg::new("population-size")
                .long("population-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Population size (default: 500)"),
        )
        .arg(
            Arg::new("generations-count")
                .long("generations-count")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Fixed number of generations (default: derived from the paths)"),
        )
        .arg(
            Arg::new("mutation-chance")
                .long("mutation-chance")
                .value_name("P")
                .value_parser(value_parser!(f64))
                .help("Probability that a child is expanded (default: 0.5)"),
        )
        .arg(
            Arg::new("window-count")
                .long("window-count")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Number of progress windows (default: 20)"),
        )
        .arg(
            Arg::new("min-window-size")
                .long("min-window-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Minimal generations per window (default: 2)"),
        )
        .arg(
            Arg::new("max-window-size")
                .long("max-window-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Maximal generations per window (default: 100)"),
        )
        .arg(
            Arg::new("required-progress")
                .long("required-progress")
                .value_name("PERCENT")
                .value_parser(value_parser!(f64))
                .help("Minimal hypervolume progress per window in percent (default: 0.25)"),
        )
        .arg(
            Arg::new("no-early-termination")
                .long("no-early-termination")
                .action(ArgAction::SetTrue)
                .help("Never stop because of stagnating hypervolume"),
        )
        .arg(
            Arg::new("max-hours")
                .long("max-hours")
                .value_name("HOURS")
                .value_parser(value_parser!(f64))
                .help("Wall-clock limit in hours (default: none)"),
        )
        .arg(
            Arg::new("target-network-size")
                .long("target-network-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Upper bound of the initial network sizes (default: 100)"),
        )
        .arg(
            Arg::new("focus-fraction")
                .long("focus-fraction")
                .value_name("P")
                .value_parser(value_parser!(f64))
                .help("Share of children sized from the focus range (default: 0.5)"),
        )
        .arg(
            Arg::new("sample-objective-type")
                .long("sample-objective-type")
                .value_name("TYPE")
                .value_parser(["entropy", "effective"])
                .default_value("entropy")
                .help("Scoring of the sample objective"),
        )
        .arg(
            Arg::new("no-network-size")
                .long("no-network-size")
                .action(ArgAction::SetTrue)
                .help("Drop the network size objective"),
        )
        .arg(
            Arg::new("no-sample-count")
                .long("no-sample-count")
                .action(ArgAction::SetTrue)
                .help("Drop the sample objective"),
        )
        .arg(
            Arg::new("max-paths")
                .long("max-paths")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Keep only the N best paths (default: all)"),
        )
        .arg(
            Arg::new("search-tree-cutoff")
                .long("search-tree-cutoff")
                .value_name("P")
                .value_parser(value_parser!(f64))
                .help("Ignore paths below this probability (default: 0)"),
        )
        .arg(
            Arg::new("path-length")
                .long("path-length")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Path length used by the path search (default: 4)"),
        )
        .arg(
            Arg::new("num-threads")
                .short('t')
                .long("num-threads")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Worker threads (default: all cores)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64))
                .help("Seed for reproducible runs"),
        )
        .arg(
            Arg::new("resume")
                .long("resume")
                .action(ArgAction::SetTrue)
                .help("Continue from the latest checkpoint"),
        )
        .arg(
            Arg::new("hv-tool")
                .long("hv-tool")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Folder with the wfg0/wfg2 hypervolume tools (default: built-in)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only warnings and errors, no summary"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Log record format"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Write logs to FILE instead of stderr"),
        )
}

fn init_logging(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("debug")
    } else if matches.get_flag("quiet") {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let log_file = matches.get_one::<PathBuf>("log-file");
    let writer = match log_file {
        Some(path) => BoxMakeWriter::new(Mutex::new(File::create(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(log_file.is_none())
        .with_writer(writer);

    let json = matches.get_one::<String>("log-format").map(String::as_str) == Some("json");
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| err.to_string())?;
    Ok(())
}

fn config_from_matches(matches: &ArgMatches) -> Result<OptimizerConfig, Box<dyn std::error::Error>> {
    let defaults = OptimizerConfig::default();
    let usize_or = |name: &str, default: usize| matches.get_one::<usize>(name).copied().unwrap_or(default);
    let f64_or = |name: &str, default: f64| matches.get_one::<f64>(name).copied().unwrap_or(default);
    let strings = |name: &str| -> Vec<String> {
        matches
            .get_many::<String>(name)
            .map(|values| values.filter(|value| !value.is_empty()).cloned().collect())
            .unwrap_or_default()
    };

    let sample_objective = matches
        .get_one::<String>("sample-objective-type")
        .map(|value| value.parse::<SampleMode>())
        .transpose()?
        .unwrap_or_default();

    Ok(OptimizerConfig {
        output_folder: matches
            .get_one::<PathBuf>("output-folder")
            .cloned()
            .unwrap_or_else(|| defaults.output_folder.clone()),
        path_types: strings("path-types"),
        artifacts: ArtifactPaths {
            index: matches.get_one::<PathBuf>("use-index").cloned(),
            paths: matches.get_one::<PathBuf>("use-paths").cloned(),
            circuits: matches.get_one::<PathBuf>("use-nnfs").cloned(),
        },
        regulatory_types: strings("regulatory-types"),
        population_size: usize_or("population-size", defaults.population_size),
        generations: matches.get_one::<usize>("generations-count").copied(),
        mutation_chance: f64_or("mutation-chance", defaults.mutation_chance),
        window_count: usize_or("window-count", defaults.window_count),
        min_window_size: usize_or("min-window-size", defaults.min_window_size),
        max_window_size: usize_or("max-window-size", defaults.max_window_size),
        required_progress_percentage: f64_or(
            "required-progress",
            defaults.required_progress_percentage,
        ),
        early_termination: !matches.get_flag("no-early-termination"),
        time_limit_hours: f64_or("max-hours", defaults.time_limit_hours),
        optimize_network_size: !matches.get_flag("no-network-size"),
        optimize_sample_count: !matches.get_flag("no-sample-count"),
        sample_objective,
        target_network_size: usize_or("target-network-size", defaults.target_network_size),
        focus_fraction: f64_or("focus-fraction", defaults.focus_fraction),
        path_length: usize_or("path-length", defaults.path_length),
        path_cutoff: f64_or("search-tree-cutoff", defaults.path_cutoff),
        max_paths: usize_or("max-paths", defaults.max_paths),
        num_threads: matches.get_one::<usize>("num-threads").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        resume: matches.get_flag("resume"),
        hypervolume_tools: matches.get_one::<PathBuf>("hv-tool").cloned(),
        quiet: matches.get_flag("quiet"),
        ..defaults
    })
}

/// Parses the command line, runs the optimization and reports a summary.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();
    init_logging(&matches)?;

    let config = config_from_matches(&matches)?;
    let quiet = config.quiet;
    let runner = MultiObjectiveRunner::new(config)?;
    let results = runner.run()?;

    if !quiet {
        eprintln!(
            "Optimization complete! Wrote {} networks in {:.1}s (best generation {}, hypervolume {}).",
            results.networks.len(),
            results.elapsed.as_secs_f64(),
            results.best_generation,
            results.best_hypervolume()
        );
    }

    Ok(())
}
