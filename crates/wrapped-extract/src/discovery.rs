//! Discovery extraction: the reporting period and headline reach figures.
//!
//! The discovery sheet is a short list of label/value pairs, label in
//! column A and value in column B.

use std::collections::{BTreeSet, HashMap};

use wrapped_core::DiscoveryRecord;

use crate::error::ExtractError;
use crate::landmark::DISCOVERY_SHEET;
use crate::normalize::{parse_date_range, parse_integer};
use crate::summary::SummaryMetricsExtractor;
use crate::workbook::{RawCellValue, Workbook};

pub const OVERALL_PERFORMANCE_LABEL: &str = "Overall Performance";
pub const IMPRESSIONS_LABEL: &str = "Impressions";
pub const MEMBERS_REACHED_LABEL: &str = "Members reached";

const REQUIRED_LABELS: [&str; 3] = [
    OVERALL_PERFORMANCE_LABEL,
    IMPRESSIONS_LABEL,
    MEMBERS_REACHED_LABEL,
];

const LABEL_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

/// Collects the label/value pairs of the discovery sheet.
///
/// Labels are trimmed. Rows with a blank label or a blank value are ignored,
/// and the first occurrence of a label wins.
///
/// # Errors
///
/// Returns [`ExtractError::SheetNotFound`] if the discovery sheet is absent.
pub fn read_discovery_cells(
    workbook: &Workbook,
) -> Result<HashMap<String, RawCellValue>, ExtractError> {
    let sheet = workbook.require_sheet(DISCOVERY_SHEET)?;

    let mut cells = HashMap::new();
    for row in 1..=sheet.max_row() {
        let label = sheet.cell(row, LABEL_COLUMN);
        let value = sheet.cell(row, VALUE_COLUMN);
        if label.is_blank() || value.is_blank() {
            continue;
        }
        cells
            .entry(label.display_text().trim().to_owned())
            .or_insert_with(|| value.clone());
    }

    Ok(cells)
}

/// Builds a [`DiscoveryRecord`] from the discovery label/value pairs.
///
/// When `summary` is given, its metrics are merged into the optional fields.
/// A summary failure is logged and leaves those fields `None`; it never fails
/// discovery extraction.
///
/// # Errors
///
/// Returns [`ExtractError::MissingField`] listing every absent required
/// label, or [`ExtractError::Normalization`] if the period or counts cannot
/// be parsed.
pub fn extract_discovery_data(
    cells: &HashMap<String, RawCellValue>,
    summary: Option<&SummaryMetricsExtractor<'_>>,
) -> Result<DiscoveryRecord, ExtractError> {
    let missing: BTreeSet<String> = REQUIRED_LABELS
        .iter()
        .filter(|label| !cells.contains_key(**label))
        .map(|label| (*label).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(ExtractError::MissingField {
            sheet: DISCOVERY_SHEET.to_owned(),
            fields: missing,
        });
    }

    let period = &cells[OVERALL_PERFORMANCE_LABEL];
    let (start_date, end_date) = parse_date_range(&period.display_text())?;
    let total_impressions = parse_integer(&cells[IMPRESSIONS_LABEL])?;
    let members_reached = parse_integer(&cells[MEMBERS_REACHED_LABEL])?;

    let mut record = DiscoveryRecord {
        start_date,
        end_date,
        total_impressions,
        members_reached,
        total_engagements: None,
        average_impressions_per_day: None,
        new_followers: None,
    };

    if let Some(extractor) = summary {
        match extractor.calculate(total_impressions) {
            Ok(metrics) => {
                record.total_engagements = Some(metrics.total_engagements);
                record.average_impressions_per_day = Some(metrics.average_impressions_per_day);
                record.new_followers = Some(metrics.new_followers);
            }
            Err(e) => {
                tracing::warn!(
                    sheet = DISCOVERY_SHEET,
                    error = %e,
                    "could not calculate summary metrics; leaving them unset"
                );
            }
        }
    }

    Ok(record)
}

/// Reads the discovery sheet and builds its record in one step.
///
/// # Errors
///
/// See [`read_discovery_cells`] and [`extract_discovery_data`].
pub fn extract_discovery(
    workbook: &Workbook,
    summary: Option<&SummaryMetricsExtractor<'_>>,
) -> Result<DiscoveryRecord, ExtractError> {
    let cells = read_discovery_cells(workbook)?;
    extract_discovery_data(&cells, summary)
}
