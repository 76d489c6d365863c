//! Tolerant conversion of raw cell values into strict numeric, percentage
//! and date-range types.
//!
//! The export mixes representations freely: counts arrive as numbers or as
//! text with thousands separators, percentages as fractions or as `"12.3%"`,
//! and the reporting period as a single `"MM/DD/YYYY - MM/DD/YYYY"` string.

use chrono::NaiveDate;

use crate::error::ExtractError;
use crate::workbook::RawCellValue;

/// Value substituted for the export's `"< 1%"` marker.
///
/// Matches the 0-1 fraction scale the export uses for other percentages.
pub const BELOW_ONE_PERCENT: f64 = 0.005;

const BELOW_ONE_PERCENT_MARKER: &str = "< 1%";
const DATE_RANGE_SEPARATOR: &str = " - ";
const DATE_FORMAT: &str = "%m/%d/%Y";

/// Converts a count cell to an integer, truncating toward zero.
///
/// Text has its thousands separators and surrounding whitespace removed
/// before parsing, so `"1,234"` yields `1234`.
///
/// # Errors
///
/// Returns [`ExtractError::Normalization`] for empty or date cells, text that
/// is not numeric, and values that are not finite.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_integer(raw: &RawCellValue) -> Result<i64, ExtractError> {
    parse_float(raw).map(|value| value.trunc() as i64)
}

/// Converts a metric cell to a float, keeping any fractional part.
///
/// Accepts the same shapes as [`parse_integer`]: numbers, or text with
/// thousands separators and surrounding whitespace.
///
/// # Errors
///
/// Returns [`ExtractError::Normalization`] for empty or date cells, text that
/// is not numeric, and values that are not finite.
pub fn parse_float(raw: &RawCellValue) -> Result<f64, ExtractError> {
    let value = match raw {
        RawCellValue::Number(n) => *n,
        RawCellValue::Text(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',').collect();
            parse_float_text(cleaned.trim(), s)?
        }
        RawCellValue::Date(d) => {
            return Err(ExtractError::normalization(
                d.to_string(),
                "expected a number, found a date",
            ))
        }
        RawCellValue::Empty => {
            return Err(ExtractError::normalization("", "expected a number, cell is empty"))
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExtractError::normalization(
            raw.display_text(),
            "value is not a finite number",
        ))
    }
}

/// Converts a percentage cell to a float on the export's own scale.
///
/// Numbers pass through unchanged. Text containing the `"< 1%"` marker maps
/// to [`BELOW_ONE_PERCENT`]; other text has any `%` and `<` removed before
/// parsing. The result is not clamped.
///
/// # Errors
///
/// Returns [`ExtractError::Normalization`] for empty or date cells and for
/// text that is neither numeric nor the `"< 1%"` marker.
pub fn parse_percentage(raw: &RawCellValue) -> Result<f64, ExtractError> {
    match raw {
        RawCellValue::Number(n) => Ok(*n),
        RawCellValue::Text(s) => {
            if s.contains(BELOW_ONE_PERCENT_MARKER) {
                return Ok(BELOW_ONE_PERCENT);
            }
            let cleaned = s.replace(['%', '<'], "");
            parse_float_text(cleaned.trim(), s)
        }
        RawCellValue::Date(d) => Err(ExtractError::normalization(
            d.to_string(),
            "expected a percentage, found a date",
        )),
        RawCellValue::Empty => Err(ExtractError::normalization(
            "",
            "expected a percentage, cell is empty",
        )),
    }
}

/// Splits `"MM/DD/YYYY - MM/DD/YYYY"` into its two calendar dates.
///
/// Does not check that the start precedes the end.
///
/// # Errors
///
/// Returns [`ExtractError::Normalization`] unless the text contains exactly
/// one `" - "` separator and both sides parse as `MM/DD/YYYY` dates.
pub fn parse_date_range(raw_text: &str) -> Result<(NaiveDate, NaiveDate), ExtractError> {
    let parts: Vec<&str> = raw_text.trim().split(DATE_RANGE_SEPARATOR).collect();
    let [start, end] = parts.as_slice() else {
        return Err(ExtractError::normalization(
            raw_text,
            "expected format 'MM/DD/YYYY - MM/DD/YYYY'",
        ));
    };

    let parse = |token: &str| {
        NaiveDate::parse_from_str(token.trim(), DATE_FORMAT).map_err(|e| {
            ExtractError::normalization(raw_text, format!("invalid date \"{}\": {e}", token.trim()))
        })
    };

    Ok((parse(*start)?, parse(*end)?))
}

fn parse_float_text(cleaned: &str, original: &str) -> Result<f64, ExtractError> {
    cleaned
        .parse::<f64>()
        .map_err(|e| ExtractError::normalization(original, e.to_string()))
}

/// Reads a cell as a float for column sums, or `None` when it is not numeric.
///
/// Unlike [`parse_integer`], text keeps its thousands separators, so
/// `"1,234"` is not numeric here.
pub(crate) fn numeric_value(raw: &RawCellValue) -> Option<f64> {
    let value = match raw {
        RawCellValue::Number(n) => *n,
        RawCellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCellValue::Date(_) | RawCellValue::Empty => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
