// The pipeline context: one pure entry point per run, plus the stateful
// session the presentation layer talks to.
//
// There are no ambient globals; everything a run needs travels in as
// arguments and comes back in the output. The session owns the current
// dataset and filter state between runs — a new upload replaces the prior
// dataset wholesale, and the dual-file variant's "one file loaded, waiting
// for the other" is a valid stable state, not an error.

use tracing::{info, warn};

use crate::aggregate::{combine_daily, combine_weekly, Dataset, PlayerRecord};
use crate::config::Config;
use crate::export::{date_labels, export_csv, ExportError};
use crate::parse::{combined, split, KeyedIdentity, ScoreObservation, SkippedRow};
use crate::query::{self, FilterState, PositionFilter, SortKey};

// ---------------------------------------------------------------------------
// Pure per-run core
// ---------------------------------------------------------------------------

/// Raw text for one pipeline run, tagged with its schema variant.
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    /// Single combined daily-points file.
    Combined(&'a str),
    /// Roster + weekly scores pair.
    Split { roster: &'a str, scores: &'a str },
}

/// Everything a run produces: the owned dataset, the (unchanged) filter
/// state to apply to it, and the skipped-row diagnostics from parsing.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dataset: Dataset,
    pub filter: FilterState,
    pub skipped: Vec<SkippedRow>,
}

/// Parse and aggregate one upload in a single synchronous pass.
///
/// Never fails: malformed rows become diagnostics and a file below the
/// minimum line count yields a dataset with zero records, which callers
/// surface as "no data".
pub fn run(input: RawInput<'_>, filter: FilterState, config: &Config) -> PipelineOutput {
    match input {
        RawInput::Combined(text) => {
            let tables = combined::parse(text);
            let dataset = combine_daily(
                &tables.identities,
                &tables.observations,
                &config.fantasy_weeks(),
                config.trend,
            );
            PipelineOutput {
                dataset,
                filter,
                skipped: tables.skipped,
            }
        }
        RawInput::Split { roster, scores } => {
            let roster_outcome = split::parse_roster(roster);
            let scores_outcome = split::parse_scores(scores);
            let dataset = combine_weekly(
                &roster_outcome.records,
                &scores_outcome.records,
                config.rating,
                config.trend,
            );
            let mut skipped = roster_outcome.skipped;
            skipped.extend(scores_outcome.skipped);
            PipelineOutput {
                dataset,
                filter,
                skipped,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Result of loading one file into a session.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Rows accepted from this file.
    pub accepted: usize,
    /// Diagnostics for rows dropped from this file.
    pub skipped: Vec<SkippedRow>,
    /// Whether a dataset is available after this load (the split variant
    /// stays pending until both files have arrived).
    pub dataset_ready: bool,
}

/// The mutable surface the presentation adapter drives. Owns the current
/// dataset and filter state; only ever written between fully-synchronous
/// pipeline runs.
#[derive(Debug, Default)]
pub struct Session {
    config: Config,
    pending_roster: Option<Vec<KeyedIdentity>>,
    pending_scores: Option<Vec<ScoreObservation>>,
    dataset: Option<Dataset>,
    filter: FilterState,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            pending_roster: None,
            pending_scores: None,
            dataset: None,
            filter: FilterState::default(),
        }
    }

    /// Load a combined daily-points file, replacing any prior dataset and
    /// clearing pending split-file state.
    pub fn load_combined(&mut self, text: &str) -> LoadReport {
        let output = run(RawInput::Combined(text), self.filter.clone(), &self.config);
        let accepted = output.dataset.records.len();
        self.pending_roster = None;
        self.pending_scores = None;
        self.dataset = if accepted > 0 {
            Some(output.dataset)
        } else {
            warn!("combined file produced no player records");
            None
        };
        info!(players = accepted, "loaded combined file");
        LoadReport {
            accepted,
            skipped: output.skipped,
            dataset_ready: self.dataset.is_some(),
        }
    }

    /// Load the roster half of the split variant. The dataset is (re)built
    /// once score rows are also present.
    pub fn load_roster(&mut self, text: &str) -> LoadReport {
        let outcome = split::parse_roster(text);
        let accepted = outcome.records.len();
        info!(players = accepted, "loaded roster file");
        self.pending_roster = Some(outcome.records);
        let ready = self.rebuild_split();
        LoadReport {
            accepted,
            skipped: outcome.skipped,
            dataset_ready: ready,
        }
    }

    /// Load the weekly-scores half of the split variant.
    pub fn load_scores(&mut self, text: &str) -> LoadReport {
        let outcome = split::parse_scores(text);
        let accepted = outcome.records.len();
        info!(rows = accepted, "loaded scores file");
        self.pending_scores = Some(outcome.records);
        let ready = self.rebuild_split();
        LoadReport {
            accepted,
            skipped: outcome.skipped,
            dataset_ready: ready,
        }
    }

    fn rebuild_split(&mut self) -> bool {
        match (&self.pending_roster, &self.pending_scores) {
            (Some(roster), Some(scores)) => {
                let dataset =
                    combine_weekly(roster, scores, self.config.rating, self.config.trend);
                let ready = !dataset.records.is_empty();
                self.dataset = ready.then_some(dataset);
                ready
            }
            // One file without the other is a stable waiting state.
            _ => false,
        }
    }

    /// The current dataset, if any upload has completed.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// The filtered, sorted view under the current filter state. Empty
    /// before any data is loaded.
    pub fn view(&self) -> Vec<&PlayerRecord> {
        match &self.dataset {
            Some(dataset) => query::apply(dataset, &self.filter),
            None => Vec::new(),
        }
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_position_filter(&mut self, position: PositionFilter) {
        self.filter.position = position;
    }

    pub fn set_fantasy_team_filter(&mut self, team: Option<String>) {
        self.filter.fantasy_team = team;
    }

    pub fn set_nba_team_filter(&mut self, team: Option<String>) {
        self.filter.nba_team = team;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.filter.toggle_sort(key);
    }

    /// Serialize the filter state for the presentation layer to persist.
    pub fn filter_blob(&self) -> String {
        self.filter.to_blob()
    }

    /// Replay a persisted filter-state blob; invalid blobs fall back to the
    /// defaults rather than erroring.
    pub fn restore_filter_blob(&mut self, blob: &str) {
        self.filter = FilterState::from_blob(blob);
    }

    /// Labels for the current dataset's periods: calendar dates for a daily
    /// dataset, week numbers for a weekly one.
    pub fn period_labels(&self) -> Vec<String> {
        match &self.dataset {
            Some(dataset) => match dataset.variant {
                crate::aggregate::SchemaVariant::Combined => {
                    date_labels(self.config.season.start_date, dataset.series_len)
                }
                crate::aggregate::SchemaVariant::Split => {
                    (1..=dataset.series_len).map(|i| format!("Semana {i}")).collect()
                }
            },
            None => Vec::new(),
        }
    }

    /// Re-export the current dataset to the combined CSV layout.
    pub fn export(&self) -> Result<Option<String>, ExportError> {
        match &self.dataset {
            Some(dataset) => Ok(Some(export_csv(dataset, &self.period_labels())?)),
            None => Ok(None),
        }
    }

    /// Drop all data and filters, returning to the initial state.
    pub fn reset(&mut self) {
        self.pending_roster = None;
        self.pending_scores = None;
        self.dataset = None;
        self.filter = FilterState::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
