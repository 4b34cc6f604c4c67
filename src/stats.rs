// Pure statistical functions over scoring series.
//
// Everything here operates on the *present* values of a series; callers are
// responsible for filtering out absent observations first (an absent entry
// means "not yet played", which is different from a recorded zero and must
// never leak into a mean or a standard deviation).

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// z for a 95% confidence interval.
const Z_95: f64 = 1.96;

/// Decay rate applied to the coefficient of variation in the regularity score.
const REGULARITY_DECAY: f64 = 1.5;

/// Threshold below which a mean is treated as zero.
const MEAN_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Dispersion
// ---------------------------------------------------------------------------

/// Sample standard deviation (n-1 denominator).
///
/// Returns 0.0 for fewer than two values, which keeps downstream margins and
/// ratings well-defined for players with a single recorded game.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}

/// Half-width of the 95% confidence interval around the mean:
/// `1.96 * std_dev / sqrt(n)`. Returns 0.0 when n < 2.
pub fn margin_of_error(std_dev: f64, n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    Z_95 * std_dev / (n as f64).sqrt()
}

/// Coefficient of variation: `std_dev / mean`, or 0.0 when the mean is
/// (approximately) zero or negative.
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    if mean < MEAN_EPSILON {
        return 0.0;
    }
    std_dev / mean
}

// ---------------------------------------------------------------------------
// Composite rating components
// ---------------------------------------------------------------------------

/// Week-to-week regularity on a 0-100 scale: `100 * exp(-1.5 * cv)`.
///
/// A perfectly steady scorer (cv = 0) gets 100; high-variance scorers decay
/// toward 0.
pub fn regularity_score(cv: f64) -> f64 {
    (100.0 * (-REGULARITY_DECAY * cv).exp()).clamp(0.0, 100.0)
}

/// Weights for the composite performance rating. Must sum to 1.0 (enforced
/// by config validation).
#[derive(Debug, Clone, Copy)]
pub struct RatingWeights {
    pub volume: f64,
    pub regularity: f64,
    pub activity: f64,
}

impl Default for RatingWeights {
    fn default() -> Self {
        RatingWeights {
            volume: 0.60,
            regularity: 0.40,
            activity: 0.00,
        }
    }
}

/// Inputs to the composite rating, each already on a 0-100 scale.
#[derive(Debug, Clone, Copy)]
pub struct RatingInputs {
    pub volume: f64,
    pub regularity: f64,
    pub activity: f64,
}

/// Weighted composite rating, rounded to an integer 0-100.
///
/// Forced to 0 for players with no recorded games or no points at all,
/// overriding the weighted formula: a player who never scored should never
/// look "regular".
pub fn performance_rating(
    inputs: RatingInputs,
    weights: RatingWeights,
    games_played: usize,
    total_points: f64,
) -> u8 {
    if games_played == 0 || total_points == 0.0 {
        return 0;
    }
    let blended = inputs.volume * weights.volume
        + inputs.regularity * weights.regularity
        + inputs.activity * weights.activity;
    blended.round().clamp(0.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Trend classification
// ---------------------------------------------------------------------------

/// Direction of a player's recent scoring relative to the preceding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Short arrow label for table output.
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "–",
        }
    }
}

/// Parameters for the rolling-window trend comparison.
#[derive(Debug, Clone, Copy)]
pub struct TrendParams {
    /// Width of the recent (and preceding) window.
    pub window: usize,
    /// Minimum number of present observations required to classify at all.
    pub min_observations: usize,
    /// Relative change (fraction of the previous mean) needed to leave Flat.
    pub threshold: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        TrendParams {
            window: 4,
            min_observations: 6,
            threshold: 0.05,
        }
    }
}

/// Classify a series of *present* values as Up, Down, or Flat.
///
/// Compares the mean of the last `window` values against the mean of the
/// values immediately preceding them (up to `window` of those; with the
/// minimum of six observations the preceding window holds only two).
/// Fewer than `min_observations` values → Flat. The 5% band is taken on the
/// magnitude of the previous mean so a negative baseline cannot flip the
/// comparison.
pub fn classify_trend(values: &[f64], params: TrendParams) -> Trend {
    if values.len() < params.min_observations || params.window == 0 {
        return Trend::Flat;
    }
    let recent = &values[values.len() - params.window..];
    let prior_end = values.len() - params.window;
    let prior_start = prior_end.saturating_sub(params.window);
    let previous = &values[prior_start..prior_end];
    if previous.is_empty() {
        return Trend::Flat;
    }

    let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let previous_mean = previous.iter().sum::<f64>() / previous.len() as f64;
    let band = previous_mean.abs() * params.threshold;

    if recent_mean - previous_mean > band {
        Trend::Up
    } else if previous_mean - recent_mean > band {
        Trend::Down
    } else {
        Trend::Flat
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
