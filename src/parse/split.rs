// Split dual-file variant: a roster file (player identities keyed by id)
// and a weekly scores file (one row per player-week), combined later by the
// aggregator once both are loaded.

use tracing::warn;

use crate::parse::{
    parse_score, raw_line_count, read_rows, KeyedIdentity, ParseOutcome, PlayerIdentity,
    ScoreObservation, SkipReason, SkippedRow,
};

/// Header lines preceding the data in either split file.
const HEADER_LINES: usize = 1;

/// Roster columns: `ID;Name;FantasyTeam;NBATeam;Position;ExternalLink?`.
const ROSTER_MIN_FIELDS: usize = 5;

/// Score columns: `ID;WeekIndex;Points;...` (extra columns ignored).
const SCORES_MIN_FIELDS: usize = 3;

/// Parse the roster file. The external link column is optional; an empty or
/// missing link reads as `None`.
pub fn parse_roster(text: &str) -> ParseOutcome<KeyedIdentity> {
    if raw_line_count(text) <= HEADER_LINES {
        return ParseOutcome::empty();
    }

    let mut outcome = ParseOutcome::empty();

    for (line, row) in read_rows(text).into_iter().skip(HEADER_LINES) {
        if row.len() < ROSTER_MIN_FIELDS {
            warn!(line, fields = row.len(), "skipping short roster row");
            outcome.skipped.push(SkippedRow {
                line,
                reason: SkipReason::TooFewFields {
                    found: row.len(),
                    required: ROSTER_MIN_FIELDS,
                },
            });
            continue;
        }

        let id = row[0].trim().to_string();
        if id.is_empty() {
            warn!(line, "skipping roster row with empty id");
            outcome.skipped.push(SkippedRow {
                line,
                reason: SkipReason::EmptyId,
            });
            continue;
        }

        let external_link = row
            .get(5)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        outcome.records.push(KeyedIdentity {
            key: id.clone(),
            identity: PlayerIdentity {
                id,
                name: row[1].trim().to_string(),
                fantasy_team: row[2].trim().to_string(),
                nba_team: row[3].trim().to_string(),
                position: row[4].trim().to_uppercase(),
                external_link,
            },
        });
    }

    outcome
}

/// Parse the weekly scores file. Rows with an empty id or a week index that
/// does not read as an integer >= 1 are dropped with a diagnostic; a points
/// cell that fails to parse stays in the row as an absent value.
pub fn parse_scores(text: &str) -> ParseOutcome<ScoreObservation> {
    if raw_line_count(text) <= HEADER_LINES {
        return ParseOutcome::empty();
    }

    let mut outcome = ParseOutcome::empty();

    for (line, row) in read_rows(text).into_iter().skip(HEADER_LINES) {
        if row.len() < SCORES_MIN_FIELDS {
            warn!(line, fields = row.len(), "skipping short scores row");
            outcome.skipped.push(SkippedRow {
                line,
                reason: SkipReason::TooFewFields {
                    found: row.len(),
                    required: SCORES_MIN_FIELDS,
                },
            });
            continue;
        }

        let id = row[0].trim().to_string();
        if id.is_empty() {
            warn!(line, "skipping scores row with empty id");
            outcome.skipped.push(SkippedRow {
                line,
                reason: SkipReason::EmptyId,
            });
            continue;
        }

        let week_field = row[1].trim();
        let time_index = match week_field.parse::<u32>() {
            Ok(idx) if idx >= 1 => idx,
            _ => {
                warn!(line, week = week_field, "skipping scores row with bad week index");
                outcome.skipped.push(SkippedRow {
                    line,
                    reason: SkipReason::BadTimeIndex {
                        value: week_field.to_string(),
                    },
                });
                continue;
            }
        };

        outcome.records.push(ScoreObservation {
            player_key: id,
            time_index,
            points: parse_score(&row[2]),
        });
    }

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
