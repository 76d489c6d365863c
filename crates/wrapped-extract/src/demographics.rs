//! Audience demographics extraction.
//!
//! The demographics sheet is a single three-column block under a header
//! row: category label (A), item (B) and percentage (C). Rows belonging to
//! one category are contiguous in the export, but nothing here relies on it.

use wrapped_core::{DemographicCategory, DemographicEntry, DemographicsRecord};

use crate::error::ExtractError;
use crate::landmark::DEMOGRAPHICS_SHEET;
use crate::normalize::parse_percentage;
use crate::workbook::{RawCellValue, Workbook};

const FIRST_DATA_ROW: usize = 2;
const CATEGORY_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;
const PERCENTAGE_COLUMN: usize = 3;

/// Reads every recognized demographic row, grouped by category.
///
/// All six categories are always present in the result, empty when the
/// sheet has no rows for them. Rows with an unknown category label are
/// ignored, and rows whose percentage cannot be normalized are dropped with
/// a warning. Source order is kept within each category.
///
/// # Errors
///
/// Returns [`ExtractError::SheetNotFound`] only when the demographics sheet
/// is absent.
pub fn parse_demographics_sheet(workbook: &Workbook) -> Result<DemographicsRecord, ExtractError> {
    let sheet = workbook.require_sheet(DEMOGRAPHICS_SHEET)?;
    let mut record = DemographicsRecord::default();

    for row in FIRST_DATA_ROW..=sheet.max_row() {
        let category_cell = sheet.cell(row, CATEGORY_COLUMN);
        let value_cell = sheet.cell(row, VALUE_COLUMN);
        let percentage_cell = sheet.cell(row, PERCENTAGE_COLUMN);
        if category_cell.is_blank()
            || value_cell.is_blank()
            || matches!(percentage_cell, RawCellValue::Empty)
        {
            continue;
        }

        let label = category_cell.display_text();
        let Some(category) = DemographicCategory::from_source_label(label.trim()) else {
            tracing::debug!(
                sheet = DEMOGRAPHICS_SHEET,
                row,
                category = label.trim(),
                "ignoring row with unrecognized category"
            );
            continue;
        };

        let percentage = match parse_percentage(percentage_cell) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    sheet = DEMOGRAPHICS_SHEET,
                    row,
                    category = %category,
                    error = %e,
                    "skipping demographic row with unreadable percentage"
                );
                continue;
            }
        };

        record.entries_mut(category).push(DemographicEntry {
            name: value_cell.display_text().trim().to_owned(),
            percentage,
        });
    }

    tracing::debug!(
        sheet = DEMOGRAPHICS_SHEET,
        entries = record.entry_count(),
        "parsed demographics"
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::BELOW_ONE_PERCENT;
    use crate::workbook::Sheet;

    fn row(category: &str, value: &str, percentage: RawCellValue) -> Vec<RawCellValue> {
        vec![category.into(), value.into(), percentage]
    }

    fn header() -> Vec<RawCellValue> {
        vec!["Top Demographics".into(), "Value".into(), "Percentage".into()]
    }

    fn workbook(rows: Vec<Vec<RawCellValue>>) -> Workbook {
        let mut all = vec![header()];
        all.extend(rows);
        Workbook::new(vec![Sheet::new(DEMOGRAPHICS_SHEET, all)])
    }

    #[test]
    fn missing_sheet_is_the_only_fatal_error() {
        assert!(matches!(
            parse_demographics_sheet(&Workbook::default()),
            Err(ExtractError::SheetNotFound { sheet }) if sheet == DEMOGRAPHICS_SHEET
        ));
    }

    #[test]
    fn empty_sheet_yields_all_six_empty_categories() {
        let record = parse_demographics_sheet(&workbook(vec![])).unwrap();
        assert_eq!(record.iter().count(), 6);
        assert!(record.iter().all(|(_, entries)| entries.is_empty()));
    }

    #[test]
    fn groups_rows_by_category_in_source_order() {
        let record = parse_demographics_sheet(&workbook(vec![
            row("Job titles", "Software Engineer", 0.0734_f64.into()),
            row("Locations", "Greater Seattle Area", "12.3%".into()),
            row("Job titles", "Founder", 0.041_f64.into()),
            row("Company size", "10,001+ employees", "< 1%".into()),
        ]))
        .unwrap();

        let titles = record.entries(DemographicCategory::JobTitles);
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].name, "Software Engineer");
        assert_eq!(titles[1].name, "Founder");

        let locations = record.entries(DemographicCategory::Locations);
        assert!((locations[0].percentage - 12.3).abs() < 1e-9);

        let sizes = record.entries(DemographicCategory::CompanySize);
        assert!((sizes[0].percentage - BELOW_ONE_PERCENT).abs() < f64::EPSILON);

        assert!(record.entries(DemographicCategory::Industries).is_empty());
        assert_eq!(record.entry_count(), 4);
    }

    #[test]
    fn unknown_and_differently_cased_categories_are_dropped() {
        let record = parse_demographics_sheet(&workbook(vec![
            row("Schools", "State University", 0.02_f64.into()),
            row("job titles", "Engineer", 0.02_f64.into()),
            row("Industries", "Software Development", 0.3_f64.into()),
        ]))
        .unwrap();
        assert_eq!(record.entry_count(), 1);
        assert_eq!(record.industries[0].name, "Software Development");
    }

    #[test]
    fn category_labels_are_trimmed() {
        let record = parse_demographics_sheet(&workbook(vec![row(
            " Seniority ",
            " Senior ",
            0.4_f64.into(),
        )]))
        .unwrap();
        assert_eq!(record.seniority[0].name, "Senior");
    }

    #[test]
    fn unreadable_percentage_skips_only_that_row() {
        let record = parse_demographics_sheet(&workbook(vec![
            row("Companies", "Acme", "lots".into()),
            row("Companies", "Globex", "3%".into()),
        ]))
        .unwrap();
        assert_eq!(record.companies.len(), 1);
        assert_eq!(record.companies[0].name, "Globex");
    }

    #[test]
    fn rows_with_blank_cells_are_skipped() {
        let record = parse_demographics_sheet(&workbook(vec![
            row("Locations", "", 0.1_f64.into()),
            row("Locations", "Berlin", RawCellValue::Empty),
            row("", "Paris", 0.1_f64.into()),
            row("Locations", "Oslo", 0.1_f64.into()),
        ]))
        .unwrap();
        assert_eq!(record.locations.len(), 1);
        assert_eq!(record.locations[0].name, "Oslo");
    }

    #[test]
    fn percentages_are_not_clamped() {
        let record = parse_demographics_sheet(&workbook(vec![row(
            "Industries",
            "Odd",
            "140%".into(),
        )]))
        .unwrap();
        assert!((record.industries[0].percentage - 140.0).abs() < 1e-9);
    }
}
