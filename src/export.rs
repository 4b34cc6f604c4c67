// CSV re-export of a loaded dataset, plus the label generation the table
// and chart axes share.
//
// The export mirrors the combined input layout: two header lines (column
// labels, then date labels), then one row per player. Score cells use the
// Spanish-locale comma as the decimal separator and an empty string for
// absent values, so a re-export of a just-imported file reproduces it
// modulo decimal normalization.

use chrono::{Datelike, Days, NaiveDate};
use thiserror::Error;

use crate::aggregate::Dataset;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Spanish three-letter month abbreviations, as `es-ES` renders them.
const SPANISH_MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Axis labels for a daily series: `"21-oct"`, `"22-oct"`, ...
pub fn date_labels(start: NaiveDate, num_days: usize) -> Vec<String> {
    (0..num_days)
        .map(|offset| {
            let date = start
                .checked_add_days(Days::new(offset as u64))
                .unwrap_or(start);
            format!("{}-{}", date.day(), SPANISH_MONTHS[date.month0() as usize])
        })
        .collect()
}

/// Column-index labels for the first header line: `"Día 1"`, `"Día 2"`, ...
pub fn day_headers(num_days: usize) -> Vec<String> {
    (1..=num_days).map(|i| format!("Día {i}")).collect()
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to finalize CSV export")]
    Finalize,
}

/// Format a score cell: empty for absent, comma decimal otherwise.
fn format_score(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string().replace('.', ","),
        None => String::new(),
    }
}

const IDENTITY_HEADERS: [&str; 4] = ["Equipo Fantasy", "Nombre", "Equipo NBA", "Posicion"];

/// Render the dataset back to the combined CSV layout.
///
/// `period_labels` fills the second header line (date labels for a daily
/// dataset, week labels for a weekly one) and is padded or truncated to the
/// dataset's series length.
pub fn export_csv(dataset: &Dataset, period_labels: &[String]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    let mut first_header: Vec<String> =
        IDENTITY_HEADERS.iter().map(|h| h.to_string()).collect();
    first_header.extend(day_headers(dataset.series_len));
    writer.write_record(&first_header)?;

    let mut second_header: Vec<String> =
        IDENTITY_HEADERS.iter().map(|h| h.to_string()).collect();
    for index in 0..dataset.series_len {
        second_header.push(period_labels.get(index).cloned().unwrap_or_default());
    }
    writer.write_record(&second_header)?;

    for record in &dataset.records {
        let mut row = vec![
            record.identity.fantasy_team.clone(),
            record.identity.name.clone(),
            record.identity.nba_team.clone(),
            record.identity.position.clone(),
        ];
        for index in 0..dataset.series_len {
            row.push(format_score(record.series.get(index).copied().flatten()));
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|_| ExportError::Finalize)?;
    String::from_utf8(bytes).map_err(|_| ExportError::Finalize)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
