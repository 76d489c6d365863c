//! Engagement-derived summary metrics merged into the discovery record.
//!
//! Columns are located by header text, not position. The followers sheet
//! carries two banner rows above its header, so its header sits in row 3
//! while the engagement sheet's header is in row 1.

use crate::error::ExtractError;
use crate::landmark::{ENGAGEMENT_SHEET, FOLLOWERS_SHEET};
use crate::normalize::numeric_value;
use crate::workbook::Workbook;

const ENGAGEMENTS_HEADER: &str = "Engagements";
const ENGAGEMENT_HEADER_ROW: usize = 1;
const NEW_FOLLOWERS_HEADER: &str = "New followers";
const FOLLOWERS_HEADER_ROW: usize = 3;
const DAYS_PER_YEAR: f64 = 365.0;

/// The three metrics derived from sheets other than the discovery sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub total_engagements: i64,
    pub average_impressions_per_day: f64,
    pub new_followers: i64,
}

/// Calculates [`SummaryMetrics`] against one workbook.
///
/// Handed to discovery extraction, which merges the result when it succeeds.
#[derive(Debug, Clone, Copy)]
pub struct SummaryMetricsExtractor<'a> {
    workbook: &'a Workbook,
}

impl<'a> SummaryMetricsExtractor<'a> {
    #[must_use]
    pub fn new(workbook: &'a Workbook) -> Self {
        Self { workbook }
    }

    /// See [`calculate_summary_metrics`].
    ///
    /// # Errors
    ///
    /// Propagates the first failing aggregation.
    pub fn calculate(&self, total_impressions: i64) -> Result<SummaryMetrics, ExtractError> {
        calculate_summary_metrics(self.workbook, total_impressions)
    }
}

/// Sums the `Engagements` column of the engagement sheet.
///
/// Non-numeric cells are skipped; the sum is truncated at the end.
///
/// # Errors
///
/// Returns [`ExtractError::SheetNotFound`] if the sheet is absent, or
/// [`ExtractError::MissingField`] if row 1 has no `Engagements` header.
pub fn get_total_engagements(workbook: &Workbook) -> Result<i64, ExtractError> {
    sum_column(
        workbook,
        ENGAGEMENT_SHEET,
        ENGAGEMENTS_HEADER,
        ENGAGEMENT_HEADER_ROW,
    )
}

/// Average impressions per day over a 365-day year.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidArgument`] if `total_impressions` is negative.
#[allow(clippy::cast_precision_loss)]
pub fn get_average_daily_impressions(total_impressions: i64) -> Result<f64, ExtractError> {
    if total_impressions < 0 {
        return Err(ExtractError::InvalidArgument(format!(
            "total impressions cannot be negative (got {total_impressions})"
        )));
    }
    Ok(total_impressions as f64 / DAYS_PER_YEAR)
}

/// Sums the `New followers` column of the followers sheet (header row 3,
/// data from row 4).
///
/// # Errors
///
/// Returns [`ExtractError::SheetNotFound`] if the sheet is absent, or
/// [`ExtractError::MissingField`] if row 3 has no `New followers` header.
pub fn get_new_followers(workbook: &Workbook) -> Result<i64, ExtractError> {
    sum_column(
        workbook,
        FOLLOWERS_SHEET,
        NEW_FOLLOWERS_HEADER,
        FOLLOWERS_HEADER_ROW,
    )
}

/// Computes all three summary metrics, all or nothing.
///
/// # Errors
///
/// Propagates the first failure, in the order engagements, average,
/// followers. No partial result is returned.
pub fn calculate_summary_metrics(
    workbook: &Workbook,
    total_impressions: i64,
) -> Result<SummaryMetrics, ExtractError> {
    let total_engagements = get_total_engagements(workbook)?;
    let average_impressions_per_day = get_average_daily_impressions(total_impressions)?;
    let new_followers = get_new_followers(workbook)?;

    Ok(SummaryMetrics {
        total_engagements,
        average_impressions_per_day,
        new_followers,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn sum_column(
    workbook: &Workbook,
    sheet_name: &str,
    header: &str,
    header_row: usize,
) -> Result<i64, ExtractError> {
    let sheet = workbook.require_sheet(sheet_name)?;
    let column = sheet
        .find_column(header_row, header)
        .ok_or_else(|| ExtractError::missing_field(sheet_name, header))?;

    let mut total = 0.0_f64;
    for row in (header_row + 1)..=sheet.max_row() {
        let cell = sheet.cell(row, column);
        if cell.is_blank() {
            continue;
        }
        match numeric_value(cell) {
            Some(value) => total += value,
            None => tracing::debug!(
                sheet = sheet_name,
                row,
                column,
                value = %cell.display_text(),
                "skipping non-numeric cell in summed column"
            ),
        }
    }

    Ok(total.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{RawCellValue, Sheet};

    fn engagement_sheet() -> Sheet {
        Sheet::new(
            ENGAGEMENT_SHEET,
            vec![
                vec!["Date".into(), "Impressions".into(), " engagements ".into()],
                vec!["11/11/2024".into(), 1200.0_f64.into(), 10.5_f64.into()],
                vec!["11/12/2024".into(), 900.0_f64.into(), "7".into()],
                vec!["11/13/2024".into(), 800.0_f64.into(), "n/a".into()],
                vec!["11/14/2024".into(), 700.0_f64.into(), RawCellValue::Empty],
                vec!["11/15/2024".into(), 600.0_f64.into(), 3.0_f64.into()],
            ],
        )
    }

    fn followers_sheet() -> Sheet {
        Sheet::new(
            FOLLOWERS_SHEET,
            vec![
                vec!["Total followers on 11/10/2025:".into(), 4210.0_f64.into()],
                vec![],
                vec!["Date".into(), "New followers".into()],
                vec!["11/11/2024".into(), 4.0_f64.into()],
                vec!["11/12/2024".into(), (-2.0_f64).into()],
                vec!["11/13/2024".into(), "9".into()],
            ],
        )
    }

    fn full_workbook() -> Workbook {
        Workbook::new(vec![engagement_sheet(), followers_sheet()])
    }

    #[test]
    fn total_engagements_sums_numeric_cells_and_truncates() {
        // 10.5 + 7 + 3 = 20.5
        assert_eq!(get_total_engagements(&full_workbook()).unwrap(), 20);
    }

    #[test]
    fn total_engagements_missing_sheet() {
        let workbook = Workbook::new(vec![followers_sheet()]);
        assert!(matches!(
            get_total_engagements(&workbook),
            Err(ExtractError::SheetNotFound { sheet }) if sheet == ENGAGEMENT_SHEET
        ));
    }

    #[test]
    fn total_engagements_missing_header() {
        let sheet = Sheet::new(
            ENGAGEMENT_SHEET,
            vec![vec!["Date".into(), "Clicks".into()], vec!["x".into(), 1.0_f64.into()]],
        );
        let workbook = Workbook::new(vec![sheet]);
        let err = get_total_engagements(&workbook).unwrap_err();
        assert!(
            matches!(err, ExtractError::MissingField { ref fields, .. } if fields.contains("Engagements"))
        );
    }

    #[test]
    fn new_followers_reads_header_from_row_three() {
        // 4 - 2 + 9
        assert_eq!(get_new_followers(&full_workbook()).unwrap(), 11);
    }

    #[test]
    fn new_followers_header_in_row_one_is_not_found() {
        let sheet = Sheet::new(
            FOLLOWERS_SHEET,
            vec![
                vec!["Date".into(), "New followers".into()],
                vec!["11/11/2024".into(), 4.0_f64.into()],
            ],
        );
        let workbook = Workbook::new(vec![sheet]);
        assert!(matches!(
            get_new_followers(&workbook),
            Err(ExtractError::MissingField { .. })
        ));
    }

    #[test]
    fn new_followers_can_be_negative() {
        let sheet = Sheet::new(
            FOLLOWERS_SHEET,
            vec![
                vec![],
                vec![],
                vec!["Date".into(), "New followers".into()],
                vec!["11/11/2024".into(), (-5.0_f64).into()],
            ],
        );
        let workbook = Workbook::new(vec![sheet]);
        assert_eq!(get_new_followers(&workbook).unwrap(), -5);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn average_daily_impressions_divides_by_year() {
        assert_eq!(get_average_daily_impressions(365).unwrap(), 1.0);
        assert_eq!(get_average_daily_impressions(0).unwrap(), 0.0);
    }

    #[test]
    fn average_daily_impressions_rejects_negative() {
        assert!(matches!(
            get_average_daily_impressions(-1),
            Err(ExtractError::InvalidArgument(_))
        ));
    }

    #[test]
    fn calculate_summary_metrics_combines_all_three() {
        let metrics = calculate_summary_metrics(&full_workbook(), 857_000).unwrap();
        assert_eq!(metrics.total_engagements, 20);
        assert_eq!(metrics.new_followers, 11);
        assert!((metrics.average_impressions_per_day - 857_000.0 / 365.0).abs() < 1e-9);
    }

    #[test]
    fn calculate_summary_metrics_is_all_or_nothing() {
        let workbook = Workbook::new(vec![engagement_sheet()]);
        assert!(matches!(
            calculate_summary_metrics(&workbook, 857_000),
            Err(ExtractError::SheetNotFound { sheet }) if sheet == FOLLOWERS_SHEET
        ));
    }

    #[test]
    fn calculate_summary_metrics_reports_first_failure() {
        let workbook = Workbook::default();
        assert!(matches!(
            calculate_summary_metrics(&workbook, -1),
            Err(ExtractError::SheetNotFound { sheet }) if sheet == ENGAGEMENT_SHEET
        ));
    }

    #[test]
    fn extractor_delegates_to_workbook() {
        let workbook = full_workbook();
        let extractor = SummaryMetricsExtractor::new(&workbook);
        assert_eq!(extractor.calculate(365).unwrap().new_followers, 11);
    }
}
