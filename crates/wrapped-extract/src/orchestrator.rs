//! Runs every extractor against one uploaded file and assembles the bundle.
//!
//! Extractors fail independently. A failure is logged and leaves the
//! matching bundle field unset; only an unreadable file is returned to the
//! caller.

use uuid::Uuid;
use wrapped_core::AnalyticsBundle;

use crate::demographics::parse_demographics_sheet;
use crate::discovery::extract_discovery;
use crate::error::ExtractError;
use crate::summary::SummaryMetricsExtractor;
use crate::top_posts::extract_top_posts;
use crate::workbook::Workbook;

/// Parses `bytes` and extracts a bundle stored under `file_id`.
///
/// # Errors
///
/// Returns [`ExtractError::UnreadableFile`] if the bytes are not a workbook
/// or delimited text. Every other failure is absorbed into the bundle.
pub fn extract_bundle(bytes: &[u8], file_id: Uuid) -> Result<AnalyticsBundle, ExtractError> {
    let workbook = Workbook::from_bytes(bytes)?;
    Ok(assemble_bundle(&workbook, file_id))
}

/// Builds a bundle from an already-parsed workbook.
///
/// The workbook is shared read-only by every extractor, so running this
/// twice on the same workbook yields equal bundles.
#[must_use]
pub fn assemble_bundle(workbook: &Workbook, file_id: Uuid) -> AnalyticsBundle {
    let summary = SummaryMetricsExtractor::new(workbook);

    let discovery = absorb(file_id, "discovery", extract_discovery(workbook, Some(&summary)));
    let top_posts = absorb(file_id, "top_posts", extract_top_posts(workbook));
    let demographics = absorb(file_id, "demographics", parse_demographics_sheet(workbook));

    let bundle = AnalyticsBundle {
        file_id,
        discovery,
        top_posts,
        demographics,
    };

    tracing::info!(
        %file_id,
        sheets = workbook.sheet_names().len(),
        has_discovery = bundle.discovery.is_some(),
        has_summary_metrics = bundle
            .discovery
            .as_ref()
            .is_some_and(wrapped_core::DiscoveryRecord::has_summary_metrics),
        top_posts = bundle.top_posts.as_ref().map_or(0, Vec::len),
        has_demographics = bundle.demographics.is_some(),
        "assembled analytics bundle"
    );

    bundle
}

fn absorb<T>(file_id: Uuid, section: &'static str, result: Result<T, ExtractError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%file_id, section, error = %e, "extraction failed; leaving section unset");
            None
        }
    }
}
