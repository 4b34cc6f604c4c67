// Joining parsed identities with score observations into derived player
// records: dense series, cumulative series, summary statistics, weekly
// bucketing (combined variant) and the composite rating (split variant).

use std::collections::HashMap;

use tracing::debug;

use crate::parse::{KeyedIdentity, PlayerIdentity, ScoreObservation};
use crate::stats::{
    classify_trend, coefficient_of_variation, margin_of_error, performance_rating,
    regularity_score, sample_std_dev, RatingInputs, RatingWeights, Trend, TrendParams,
};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which input format a dataset came from. Resolved once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Single combined file, one column per scoring day.
    Combined,
    /// Roster + weekly scores file pair.
    Split,
}

/// One fantasy week: a 0-based half-open `[start_day, end_day)` slice of the
/// daily series, with a display label like `"S1 (21/10 - 27/10)"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FantasyWeek {
    pub label: String,
    pub start_day: usize,
    pub end_day: usize,
}

/// Data that only exists for one schema variant.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantDetail {
    /// Combined variant: daily series bucketed into fantasy-week totals.
    Daily { weekly_totals: Vec<f64> },
    /// Split variant: composite 0-100 performance rating.
    Weekly { rating: u8 },
}

/// A player with every derived quantity the table and charts need.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub identity: PlayerIdentity,
    /// Dense per-period series, padded with absents to the dataset length.
    pub series: Vec<Option<f64>>,
    /// Running sum; an index is present here iff the series has its own
    /// value at that index (no carry-forward plateaus).
    pub cumulative: Vec<Option<f64>>,
    pub games_played: usize,
    pub total_points: f64,
    pub average_points: f64,
    pub std_dev: f64,
    pub margin_of_error_abs: f64,
    pub margin_of_error_pct: f64,
    pub trend: Trend,
    pub detail: VariantDetail,
}

impl PlayerRecord {
    /// Composite rating, present only on split-variant records.
    pub fn rating(&self) -> Option<u8> {
        match &self.detail {
            VariantDetail::Weekly { rating } => Some(*rating),
            VariantDetail::Daily { .. } => None,
        }
    }

    /// Weekly bucket totals, present only on combined-variant records.
    pub fn weekly_totals(&self) -> Option<&[f64]> {
        match &self.detail {
            VariantDetail::Daily { weekly_totals } => Some(weekly_totals),
            VariantDetail::Weekly { .. } => None,
        }
    }
}

/// The aggregation output. Owns its records; the query engine only ever
/// borrows views into it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub variant: SchemaVariant,
    pub records: Vec<PlayerRecord>,
    /// Max observed time index across all players (series are padded to it).
    pub series_len: usize,
}

// ---------------------------------------------------------------------------
// Series construction
// ---------------------------------------------------------------------------

/// Per-player intermediate: the dense series plus everything derived from it
/// that does not need cross-player context.
struct SeriesBuild {
    series: Vec<Option<f64>>,
    cumulative: Vec<Option<f64>>,
    present: Vec<f64>,
    /// The player's own observed length (their row's last score cell),
    /// which can be shorter than the padded dataset length.
    observed_len: usize,
    total_points: f64,
    average_points: f64,
    std_dev: f64,
    margin_abs: f64,
    margin_pct: f64,
}

type SparseSeries = HashMap<u32, Option<f64>>;

/// Group observations by player key. A repeated (key, index) cell keeps the
/// latest value, the same way duplicate rows resolve in the exports.
fn group_observations(observations: &[ScoreObservation]) -> HashMap<&str, SparseSeries> {
    let mut grouped: HashMap<&str, SparseSeries> = HashMap::new();
    for obs in observations {
        grouped
            .entry(obs.player_key.as_str())
            .or_default()
            .insert(obs.time_index, obs.points);
    }
    grouped
}

fn build_series(sparse: Option<&SparseSeries>, max_index: u32) -> SeriesBuild {
    let mut series = Vec::with_capacity(max_index as usize);
    let mut present = Vec::new();
    for index in 1..=max_index {
        let value = sparse.and_then(|s| s.get(&index).copied()).flatten();
        if let Some(v) = value {
            present.push(v);
        }
        series.push(value);
    }

    // Cumulative sum. An index without its own observation stays absent
    // rather than carrying the previous sum forward as a plateau.
    let mut cumulative = Vec::with_capacity(series.len());
    let mut running = 0.0;
    for value in &series {
        cumulative.push(value.map(|v| {
            running += v;
            running
        }));
    }

    let observed_len = sparse
        .and_then(|s| s.keys().max().copied())
        .unwrap_or(0) as usize;

    let games_played = present.len();
    let total_points: f64 = present.iter().sum();
    let average_points = if games_played > 0 {
        total_points / games_played as f64
    } else {
        0.0
    };
    let std_dev = sample_std_dev(&present);
    let margin_abs = margin_of_error(std_dev, games_played);
    let margin_pct = if average_points > 0.0 {
        margin_abs / average_points * 100.0
    } else {
        0.0
    };

    SeriesBuild {
        series,
        cumulative,
        present,
        observed_len,
        total_points,
        average_points,
        std_dev,
        margin_abs,
        margin_pct,
    }
}

fn record_from(
    identity: PlayerIdentity,
    built: SeriesBuild,
    trend_params: TrendParams,
    detail: VariantDetail,
) -> PlayerRecord {
    let trend = classify_trend(&built.present, trend_params);
    PlayerRecord {
        identity,
        games_played: built.present.len(),
        series: built.series,
        cumulative: built.cumulative,
        total_points: built.total_points,
        average_points: built.average_points,
        std_dev: built.std_dev,
        margin_of_error_abs: built.margin_abs,
        margin_of_error_pct: built.margin_pct,
        trend,
        detail,
    }
}

/// Bucket a daily series into fantasy-week totals.
///
/// A week is emitted only while its start day falls inside the player's own
/// observed daily length; the walk stops at the first week that starts
/// beyond it, so trailing unknown weeks never appear as explicit absents.
/// Inside an emitted week, absent days contribute zero — unlike the overall
/// average, which excludes them entirely.
pub fn bucket_weekly(daily: &[Option<f64>], observed_len: usize, weeks: &[FantasyWeek]) -> Vec<f64> {
    let mut totals = Vec::new();
    for week in weeks {
        if week.start_day >= observed_len {
            break;
        }
        let end = week.end_day.min(observed_len).min(daily.len());
        let sum: f64 = daily[week.start_day..end].iter().flatten().sum();
        totals.push(sum);
    }
    totals
}

// ---------------------------------------------------------------------------
// Combiners
// ---------------------------------------------------------------------------

/// Combine a parsed combined-file export into a daily dataset.
///
/// Total over its inputs: an identity with no observations yields an
/// all-absent record with zero totals, and observations without a matching
/// identity only contribute to the dataset length.
pub fn combine_daily(
    identities: &[KeyedIdentity],
    observations: &[ScoreObservation],
    weeks: &[FantasyWeek],
    trend_params: TrendParams,
) -> Dataset {
    let grouped = group_observations(observations);
    let max_index = observations.iter().map(|o| o.time_index).max().unwrap_or(0);

    let records = identities
        .iter()
        .map(|keyed| {
            let built = build_series(grouped.get(keyed.key.as_str()), max_index);
            let weekly_totals = bucket_weekly(&built.series, built.observed_len, weeks);
            record_from(
                keyed.identity.clone(),
                built,
                trend_params,
                VariantDetail::Daily { weekly_totals },
            )
        })
        .collect();

    debug!(players = identities.len(), days = max_index, "built daily dataset");

    Dataset {
        variant: SchemaVariant::Combined,
        records,
        series_len: max_index as usize,
    }
}

/// Combine roster + weekly scores into a weekly dataset with ratings.
///
/// Roster players without any score rows still appear, carrying a fully
/// absent series and a rating of zero.
pub fn combine_weekly(
    identities: &[KeyedIdentity],
    observations: &[ScoreObservation],
    weights: RatingWeights,
    trend_params: TrendParams,
) -> Dataset {
    let grouped = group_observations(observations);
    let max_index = observations.iter().map(|o| o.time_index).max().unwrap_or(0);

    let builds: Vec<SeriesBuild> = identities
        .iter()
        .map(|keyed| build_series(grouped.get(keyed.key.as_str()), max_index))
        .collect();

    // Volume is scored relative to the best total in the file.
    let max_total = builds
        .iter()
        .map(|b| b.total_points)
        .fold(0.0_f64, f64::max);

    let records = identities
        .iter()
        .zip(builds)
        .map(|(keyed, built)| {
            let volume = if max_total > 0.0 {
                built.total_points / max_total * 100.0
            } else {
                0.0
            };
            let cv = coefficient_of_variation(built.std_dev, built.average_points);
            let activity = if max_index > 0 {
                built.present.len() as f64 / max_index as f64 * 100.0
            } else {
                0.0
            };
            let rating = performance_rating(
                RatingInputs {
                    volume,
                    regularity: regularity_score(cv),
                    activity,
                },
                weights,
                built.present.len(),
                built.total_points,
            );
            record_from(
                keyed.identity.clone(),
                built,
                trend_params,
                VariantDetail::Weekly { rating },
            )
        })
        .collect();

    debug!(players = identities.len(), weeks = max_index, "built weekly dataset");

    Dataset {
        variant: SchemaVariant::Split,
        records,
        series_len: max_index as usize,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
