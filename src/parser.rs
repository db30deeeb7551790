//! Parsing and validation of tab-separated MHEALTH log content.
//!
//! Validation is whole-file: rows are read first, then the column count is
//! checked once across the file. A log with ragged rows is reported as a
//! single [`DetectError::Schema`] rather than failing on the first bad row.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::DetectError;
use crate::models::{SensorLog, SensorRecord};
use crate::schema::{FEATURE_COLUMNS, N_COLUMNS, N_FEATURES};

// ---

/// Parse raw upload bytes into a validated [`SensorLog`].
pub fn parse_log(bytes: &[u8]) -> Result<SensorLog, DetectError> {
    // ---
    let text = std::str::from_utf8(bytes)?;
    parse_log_str(text)
}

/// Parse already-decoded log text.
///
/// Empty lines are skipped and `\r\n` line endings are accepted. Any other
/// line is a row, so a line of bare tabs fails as a non-numeric value. A
/// file with no data rows is a schema error with an observed count of zero.
pub fn parse_log_str(text: &str) -> Result<SensorLog, DetectError> {
    // ---
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let rows = reader
        .records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>()?;

    check_column_count(rows.iter().map(StringRecord::len))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let record: SensorRecord = row
            .deserialize(None)
            .map_err(|err| invalid_value(row, &err))?;
        records.push(record);
    }

    tracing::debug!("Parsed log with {} rows", records.len());
    Ok(SensorLog { records })
}

/// Validate the column count of the whole file at once.
///
/// When rows disagree the reported count is the widest row if that is not
/// the expected width, otherwise the narrowest.
fn check_column_count(widths: impl Iterator<Item = usize>) -> Result<(), DetectError> {
    // ---
    let (min, max) = widths.fold((usize::MAX, 0), |(lo, hi), w| (lo.min(w), hi.max(w)));

    if max == 0 {
        return Err(DetectError::Schema { observed: 0 });
    }
    if max != N_COLUMNS {
        return Err(DetectError::Schema { observed: max });
    }
    if min != N_COLUMNS {
        return Err(DetectError::Schema { observed: min });
    }
    Ok(())
}

/// Map a row deserialize failure onto the offending feature column.
///
/// The label never fails (see [`crate::activity::deserialize_label`]), so
/// the failing field is always a feature.
fn invalid_value(row: &StringRecord, err: &csv::Error) -> DetectError {
    // ---
    let field = match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.field(),
        _ => None,
    };
    let index = field.map_or(0, |f| f as usize).min(N_FEATURES - 1);

    DetectError::InvalidValue {
        line: row.position().map_or(0, |p| p.line() as usize),
        column: FEATURE_COLUMNS[index],
        value: row.get(index).unwrap_or_default().to_string(),
    }
}
