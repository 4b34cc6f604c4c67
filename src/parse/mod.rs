// CSV parsing for the two export formats the league tooling produces.
//
// Two schema variants exist in the wild: a combined single file carrying
// identity columns plus one column per scoring day, and a split pair of
// files (roster + weekly scores) joined by player id. Both are
// semicolon-delimited and loosely structured; malformed rows are skipped
// with a diagnostic, never fatal.

pub mod combined;
pub mod split;

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// Who a player is, as parsed from an input file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerIdentity {
    /// Roster id from the split variant; empty in the combined variant,
    /// which has no id column.
    pub id: String,
    pub name: String,
    pub fantasy_team: String,
    pub nba_team: String,
    /// Possibly multi-valued, e.g. "PG/SG". Stored upper-cased.
    pub position: String,
    pub external_link: Option<String>,
}

/// An identity plus the join key used to match score observations against it.
///
/// The split variant keys by roster id. The combined variant has no id
/// column — identity and scores come from the same row — so its parser
/// assigns row-ordinal keys and the pairing is inherent.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedIdentity {
    pub key: String,
    pub identity: PlayerIdentity,
}

/// One scoring cell for one player at one time index (a day or a week,
/// depending on the variant).
///
/// `points: None` means no value was recorded — the game or week has not
/// been played yet. That is different from `Some(0.0)` (played, scored
/// nothing) and the distinction is preserved through every downstream
/// computation. An absent cell still counts toward the player's observed
/// series length.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreObservation {
    pub player_key: String,
    /// 1-based day or week index.
    pub time_index: u32,
    pub points: Option<f64>,
}

// ---------------------------------------------------------------------------
// Outcome & diagnostics
// ---------------------------------------------------------------------------

/// Why a data row was dropped during parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("row has {found} fields, {required} required")]
    TooFewFields { found: usize, required: usize },

    #[error("row has an empty player id")]
    EmptyId,

    #[error("time index `{value}` is not an integer >= 1")]
    BadTimeIndex { value: String },
}

/// A dropped row: file line number (1-based) plus the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

/// What a parser hands back: the accepted records plus a diagnostic entry
/// per dropped row. Parsers never fail on malformed input; a file below the
/// minimum line count yields an empty outcome.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> ParseOutcome<T> {
    pub fn empty() -> Self {
        ParseOutcome {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Shared field rules
// ---------------------------------------------------------------------------

/// Parse a single score cell.
///
/// Empty (after trimming) means absent. Both `.` and `,` are accepted as the
/// decimal separator — later exports of the league tool switched to Spanish
/// locale formatting. Unparsable or non-finite values also read as absent,
/// never as an error; `"0"` and `"0,0"` are the number zero, not absent.
pub fn parse_score(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Read all rows of a semicolon-delimited file as positional records,
/// tagged with their 1-based line number. The caller skips header rows.
pub(crate) fn read_rows(text: &str) -> Vec<(usize, csv::StringRecord)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(rows.len() + 1);
                rows.push((line, record));
            }
            Err(e) => {
                tracing::warn!("skipping unreadable row: {}", e);
            }
        }
    }
    rows
}

/// Number of non-blank-stripped raw lines in the input. Used for the
/// minimum header+data line check, which counts physical lines the way the
/// original exports do.
pub(crate) fn raw_line_count(text: &str) -> usize {
    text.trim().lines().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
