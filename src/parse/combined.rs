// Combined single-file variant: identity columns plus one column per
// scoring day.
//
// Layout: `FantasyTeam;Name;NBATeam;Position;day_1;day_2;...` with two
// header lines (column labels, then date labels). A data row needs the four
// identity fields plus at least one score cell.

use tracing::warn;

use crate::parse::{
    parse_score, raw_line_count, read_rows, KeyedIdentity, PlayerIdentity, ScoreObservation,
    SkipReason, SkippedRow,
};

/// Header lines preceding the data in a combined export.
const HEADER_LINES: usize = 2;

/// Identity columns before the first score cell.
const IDENTITY_FIELDS: usize = 4;

/// Minimum fields for a data row: the identity columns plus one score.
const MIN_FIELDS: usize = IDENTITY_FIELDS + 1;

/// Everything parsed out of one combined file: identities and score
/// observations share row-ordinal join keys, plus the usual skip
/// diagnostics.
#[derive(Debug, Clone, Default)]
pub struct CombinedTables {
    pub identities: Vec<KeyedIdentity>,
    pub observations: Vec<ScoreObservation>,
    pub skipped: Vec<SkippedRow>,
}

impl CombinedTables {
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Parse a combined export. A file without at least the two header lines
/// and one data line yields an empty result ("no data", not an error).
pub fn parse(text: &str) -> CombinedTables {
    if raw_line_count(text) <= HEADER_LINES {
        return CombinedTables::default();
    }

    let mut tables = CombinedTables::default();

    for (line, row) in read_rows(text).into_iter().skip(HEADER_LINES) {
        if row.len() < MIN_FIELDS {
            warn!(line, fields = row.len(), "skipping short combined row");
            tables.skipped.push(SkippedRow {
                line,
                reason: SkipReason::TooFewFields {
                    found: row.len(),
                    required: MIN_FIELDS,
                },
            });
            continue;
        }

        // Identity and scores come from the same row; the key only has to
        // pair them back up in the aggregator.
        let key = format!("row-{line}");

        tables.identities.push(KeyedIdentity {
            key: key.clone(),
            identity: PlayerIdentity {
                id: String::new(),
                name: row[1].trim().to_string(),
                fantasy_team: row[0].trim().to_string(),
                nba_team: row[2].trim().to_string(),
                position: row[3].trim().to_uppercase(),
                external_link: None,
            },
        });

        for (cell, field) in row.iter().skip(IDENTITY_FIELDS).enumerate() {
            tables.observations.push(ScoreObservation {
                player_key: key.clone(),
                time_index: (cell + 1) as u32,
                points: parse_score(field),
            });
        }
    }

    tables
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
