//! Generation budget and stopping rules.

use std::time::Duration;

const EULER_GAMMA: f64 = 0.577_215_665;

/// Why a run stopped after a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Windowed hypervolume progress fell below the requirement
    Stagnation,
    /// The generation budget is used up
    GenerationLimit,
    /// The wall-clock limit has passed
    TimeLimit,
}

/// Expected number of generations needed to touch every path once.
///
/// `k` paths are expected in the initial population; the remaining
/// `m = n - E[init]` are found by mutation, which takes `m * H(m)` trials
/// (coupon collector, `H` approximated asymptotically), spread over
/// `population_size * mutation_chance` trials per generation.
#[must_use]
pub fn calculate_generations(
    number_of_paths: usize,
    size_range: (usize, usize),
    population_size: usize,
    path_length: usize,
    mutation_chance: f64,
) -> usize {
    let n = number_of_paths as f64;
    let k = (size_range.0 + size_range.1) * population_size / (path_length + 2);
    let initial = n * (1.0 - ((n - 1.0) / n).powf(k as f64));
    let m = n - initial;
    if m.is_nan() || m < 1.0 {
        return 1;
    }
    let harmonic = m.ln() + EULER_GAMMA + 1.0 / (2.0 * m) - 1.0 / (12.0 * m * m);
    let generations = (m * harmonic / (population_size as f64 * mutation_chance)).ceil();
    if generations.is_finite() && generations >= 1.0 {
        generations as usize
    } else {
        1
    }
}

/// Generation budget plus the progress and time rules checked after every
/// generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Termination {
    generations: usize,
    window: usize,
    early_termination: bool,
    required_progress_percentage: f64,
    time_limit: Option<Duration>,
}

impl Termination {
    /// Split the budget into progress windows.
    ///
    /// `fixed` is an explicit generation count; otherwise `calculated` is
    /// used and, when its windows would be shorter than `min_window`,
    /// stretched to `window_count` minimal windows.
    #[must_use]
    pub fn new(
        fixed: Option<usize>,
        calculated: usize,
        window_count: usize,
        window_range: (usize, usize),
        early_termination: bool,
        required_progress_percentage: f64,
        time_limit_hours: f64,
    ) -> Self {
        let (min_window, max_window) = window_range;
        let mut generations = fixed.unwrap_or(calculated);
        let mut window = generations / window_count.max(1);
        if window < min_window {
            window = min_window;
            if fixed.is_none() {
                generations = window_count * min_window + window_count - 1;
            }
        }
        window = window.min(max_window);

        tracing::info!(
            generations,
            window,
            required_progress = %format!("{required_progress_percentage:.3}"),
            "calculated termination generations"
        );

        let time_limit = (time_limit_hours > 0.0)
            .then(|| Duration::from_secs_f64(time_limit_hours * 3600.0));
        Self {
            generations,
            window,
            early_termination,
            required_progress_percentage,
            time_limit,
        }
    }

    #[must_use]
    pub fn generations(&self) -> usize {
        self.generations
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Relative hypervolume progress over the last window, measured against
    /// the gain of the first window. `0` without a usable baseline.
    #[must_use]
    pub fn progress(&self, t: usize, hypervolumes: &[f64]) -> f64 {
        if t == 0 || t <= self.window || t >= hypervolumes.len() {
            return 0.0;
        }
        let baseline = hypervolumes[self.window] - hypervolumes[0];
        if baseline > 0.0 {
            (hypervolumes[t] - hypervolumes[t - self.window]) / baseline
        } else {
            0.0
        }
    }

    /// Decide whether generation `t` is the last one.
    pub fn check(&self, t: usize, hypervolumes: &[f64], elapsed: Duration) -> Option<StopReason> {
        let progress = self.progress(t, hypervolumes);
        let hypervolume = hypervolumes.get(t).copied().unwrap_or(0.0);

        let reason = if self.early_termination
            && t > 0
            && t > self.window
            && progress * 100.0 < self.required_progress_percentage
        {
            Some(StopReason::Stagnation)
        } else if t + 1 >= self.generations {
            Some(StopReason::GenerationLimit)
        } else if self.time_limit.is_some_and(|limit| elapsed >= limit) {
            Some(StopReason::TimeLimit)
        } else {
            None
        };

        tracing::info!(
            generation = t,
            hypervolume,
            progress = %format!("{:.3}%", progress * 100.0),
            hours = %format!("{:.3}", elapsed.as_secs_f64() / 3600.0),
            window = self.window,
            stop = ?reason,
            "computed generation"
        );
        reason
    }
}
