// Filtering and sorting over an aggregated dataset.
//
// The query engine never owns or copies records: `apply` rebuilds a borrowed
// view from scratch on every call, which is the simplest correct design at
// these volumes (tens to low hundreds of players).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::{Dataset, PlayerRecord};

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Position filter: everything, or one position key (a concrete position
/// like `PG`, or a group key `G`/`F` that expands to the guard/forward
/// pairs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PositionFilter {
    All,
    Key(String),
}

impl From<String> for PositionFilter {
    fn from(value: String) -> Self {
        // The original UI labels the catch-all button "Todos".
        if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("todos") {
            PositionFilter::All
        } else {
            PositionFilter::Key(value.to_uppercase())
        }
    }
}

impl From<PositionFilter> for String {
    fn from(value: PositionFilter) -> Self {
        match value {
            PositionFilter::All => "all".to_string(),
            PositionFilter::Key(k) => k,
        }
    }
}

/// Sortable columns. Serialized names match the original table's sort keys
/// so persisted state replays across versions; an unknown key fails the
/// whole blob and falls back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    FantasyTeam,
    Team,
    GamesPlayed,
    TotalPoints,
    AveragePoints,
    Rating,
}

impl SortKey {
    /// Direction a freshly selected column starts in: volume/point metrics
    /// read best-first, string columns read alphabetically.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::Name | SortKey::FantasyTeam | SortKey::Team => SortDirection::Asc,
            SortKey::GamesPlayed
            | SortKey::TotalPoints
            | SortKey::AveragePoints
            | SortKey::Rating => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// The complete filter + sort selection. Persisted by the presentation
/// layer as an opaque JSON blob; an unreadable blob falls back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub position: PositionFilter,
    /// `None` means all fantasy teams.
    #[serde(default)]
    pub fantasy_team: Option<String>,
    /// `None` means all NBA teams.
    #[serde(default)]
    pub nba_team: Option<String>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl Default for PositionFilter {
    fn default() -> Self {
        PositionFilter::All
    }
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            position: PositionFilter::All,
            fantasy_team: None,
            nba_team: None,
            sort_key: SortKey::TotalPoints,
            direction: SortDirection::Desc,
        }
    }
}

impl FilterState {
    /// Select a sort column: clicking the active column toggles direction,
    /// a new column resets to its own default direction.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flip();
        } else {
            self.sort_key = key;
            self.direction = key.default_direction();
        }
    }

    /// Serialize for persistence.
    pub fn to_blob(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Restore from a persisted blob; anything invalid is discarded in
    /// favor of the defaults.
    pub fn from_blob(blob: &str) -> FilterState {
        match serde_json::from_str(blob) {
            Ok(state) => state,
            Err(e) => {
                warn!("discarding invalid persisted filter state: {}", e);
                FilterState::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Position matching
// ---------------------------------------------------------------------------

/// Expand a position key into the set of concrete positions it matches:
/// `G` covers both guard slots, `F` both forward slots, anything else
/// matches itself.
fn expand_position_key(key: &str) -> Vec<String> {
    match key.to_uppercase().as_str() {
        "G" => vec!["PG".into(), "SG".into()],
        "F" => vec!["SF".into(), "PF".into()],
        other => vec![other.to_string()],
    }
}

/// Whether a player's (possibly multi-valued) position field matches the
/// filter key. The field splits on `/` and `,`; any token matching any
/// expanded key is enough.
fn position_matches(position_field: &str, key: &str) -> bool {
    let keys = expand_position_key(key);
    position_field
        .split(|c| c == '/' || c == ',')
        .map(str::trim)
        .any(|token| keys.iter().any(|k| token.eq_ignore_ascii_case(k)))
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Filter and sort the dataset into an ordered view of borrowed records.
///
/// Pure and total: filters run fantasy-team, then NBA-team, then position;
/// the sort is stable, so ties keep their dataset order.
pub fn apply<'a>(dataset: &'a Dataset, filter: &FilterState) -> Vec<&'a PlayerRecord> {
    let mut view: Vec<&PlayerRecord> = dataset
        .records
        .iter()
        .filter(|r| {
            filter
                .fantasy_team
                .as_deref()
                .map_or(true, |team| r.identity.fantasy_team == team)
        })
        .filter(|r| {
            filter
                .nba_team
                .as_deref()
                .map_or(true, |team| r.identity.nba_team == team)
        })
        .filter(|r| match &filter.position {
            PositionFilter::All => true,
            PositionFilter::Key(key) => position_matches(&r.identity.position, key),
        })
        .collect();

    view.sort_by(|a, b| {
        let ordering = compare_by_key(a, b, filter.sort_key);
        match filter.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    view
}

fn compare_by_key(a: &PlayerRecord, b: &PlayerRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => compare_strings(&a.identity.name, &b.identity.name),
        SortKey::FantasyTeam => {
            compare_strings(&a.identity.fantasy_team, &b.identity.fantasy_team)
        }
        SortKey::Team => compare_strings(&a.identity.nba_team, &b.identity.nba_team),
        SortKey::GamesPlayed => compare_numbers(a.games_played as f64, b.games_played as f64),
        SortKey::TotalPoints => compare_numbers(a.total_points, b.total_points),
        SortKey::AveragePoints => compare_numbers(a.average_points, b.average_points),
        // A combined-variant record has no rating; it sorts as zero.
        SortKey::Rating => compare_numbers(
            f64::from(a.rating().unwrap_or(0)),
            f64::from(b.rating().unwrap_or(0)),
        ),
    }
}

fn compare_strings(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

// ---------------------------------------------------------------------------
// Selector lists & view summary
// ---------------------------------------------------------------------------

/// Sorted, deduplicated fantasy team names for the team selector.
pub fn fantasy_teams(dataset: &Dataset) -> Vec<String> {
    let mut teams: Vec<String> = dataset
        .records
        .iter()
        .map(|r| r.identity.fantasy_team.clone())
        .collect();
    teams.sort();
    teams.dedup();
    teams
}

/// Sorted, deduplicated NBA team names.
pub fn nba_teams(dataset: &Dataset) -> Vec<String> {
    let mut teams: Vec<String> = dataset
        .records
        .iter()
        .map(|r| r.identity.nba_team.clone())
        .collect();
    teams.sort();
    teams.dedup();
    teams
}

/// Mean of the per-player averages over the visible subset — the flat
/// reference line drawn across the chart. Zero for an empty view.
pub fn view_average(view: &[&PlayerRecord]) -> f64 {
    if view.is_empty() {
        return 0.0;
    }
    view.iter().map(|r| r.average_points).sum::<f64>() / view.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
