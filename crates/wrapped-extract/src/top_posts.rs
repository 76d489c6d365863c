//! Top-posts extraction.
//!
//! The top-posts sheet opens with a banner, then a header row (row 3) above
//! two side-by-side blocks: posts ranked by engagements on the left and
//! posts ranked by impressions on the right. Each block has its own
//! `Post URL` column. The engagements block drives the ranking; impressions
//! are joined in by post URL when they live in the other block.

use std::collections::HashMap;

use wrapped_core::TopPostRecord;

use crate::error::ExtractError;
use crate::landmark::TOP_POSTS_SHEET;
use crate::normalize::parse_float;
use crate::workbook::{Sheet, Workbook};

/// Number of posts surfaced as "top posts".
pub const TOP_POSTS_LIMIT: usize = 5;

const HEADER_ROW: usize = 3;
const FIRST_DATA_ROW: usize = 4;

const URL_HEADER: &str = "Post URL";
const PUBLISH_DATE_HEADER: &str = "Post publish date";
const ENGAGEMENTS_HEADER: &str = "Engagements";
const IMPRESSIONS_HEADER: &str = "Impressions";

/// Column positions of the engagements block when its headers are missing.
const DEFAULT_URL_COLUMN: usize = 1;
const DEFAULT_PUBLISH_DATE_COLUMN: usize = 2;
const DEFAULT_ENGAGEMENTS_COLUMN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    url: usize,
    publish_date: usize,
    engagements: usize,
    impressions: Option<ImpressionsSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImpressionsSource {
    /// Impressions sit in the same row as the engagements figure.
    SameRow { column: usize },
    /// Impressions sit in a separately ordered block, keyed by post URL.
    ByUrl { url_column: usize, column: usize },
}

/// Reads every post of the engagements block in source order, ranked 1..N.
///
/// Blank engagements cells are treated as padding and skipped. Rows whose
/// engagements cannot be normalized are dropped with a warning. Missing URLs
/// and publish dates become empty strings; missing impressions become `0.0`.
///
/// # Errors
///
/// Returns [`ExtractError::SheetNotFound`] only when the top-posts sheet is absent.
pub fn parse_top_posts_sheet(workbook: &Workbook) -> Result<Vec<TopPostRecord>, ExtractError> {
    let sheet = workbook.require_sheet(TOP_POSTS_SHEET)?;
    let layout = locate_columns(sheet);
    let impressions_by_url = match layout.impressions {
        Some(ImpressionsSource::ByUrl { url_column, column }) => {
            Some(collect_impressions(sheet, url_column, column))
        }
        _ => None,
    };

    let mut posts = Vec::new();
    for row in FIRST_DATA_ROW..=sheet.max_row() {
        let engagements_cell = sheet.cell(row, layout.engagements);
        if engagements_cell.is_blank() {
            continue;
        }
        let engagements = match parse_float(engagements_cell) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    sheet = TOP_POSTS_SHEET,
                    row,
                    field = ENGAGEMENTS_HEADER,
                    error = %e,
                    "skipping top post with unreadable engagements"
                );
                continue;
            }
        };

        let url = sheet.cell(row, layout.url).display_text().trim().to_owned();
        let publish_date = sheet
            .cell(row, layout.publish_date)
            .display_text()
            .trim()
            .to_owned();

        let impressions = match (layout.impressions, &impressions_by_url) {
            (Some(ImpressionsSource::SameRow { column }), _) => {
                read_impressions(sheet, row, column)
            }
            (Some(ImpressionsSource::ByUrl { .. }), Some(lookup)) => {
                lookup.get(&url).copied()
            }
            _ => None,
        }
        .unwrap_or(0.0);

        posts.push(TopPostRecord {
            rank: 0,
            url,
            publish_date,
            engagements,
            impressions,
        });
    }

    Ok(rank(posts))
}

/// Keeps the first `limit` posts and re-ranks them 1..=limit.
#[must_use]
pub fn take_top_posts(posts: Vec<TopPostRecord>, limit: usize) -> Vec<TopPostRecord> {
    rank(posts.into_iter().take(limit).collect())
}

/// Reads the top-posts sheet and keeps the first [`TOP_POSTS_LIMIT`] posts.
///
/// # Errors
///
/// See [`parse_top_posts_sheet`].
pub fn extract_top_posts(workbook: &Workbook) -> Result<Vec<TopPostRecord>, ExtractError> {
    parse_top_posts_sheet(workbook).map(|posts| take_top_posts(posts, TOP_POSTS_LIMIT))
}

fn rank(mut posts: Vec<TopPostRecord>) -> Vec<TopPostRecord> {
    for (rank, post) in (1u32..).zip(posts.iter_mut()) {
        post.rank = rank;
    }
    posts
}

fn locate_columns(sheet: &Sheet) -> Layout {
    let Some(engagements) = sheet.find_column(HEADER_ROW, ENGAGEMENTS_HEADER) else {
        tracing::warn!(
            sheet = TOP_POSTS_SHEET,
            row = HEADER_ROW,
            "engagements header not found; assuming default column layout"
        );
        return Layout {
            url: DEFAULT_URL_COLUMN,
            publish_date: DEFAULT_PUBLISH_DATE_COLUMN,
            engagements: DEFAULT_ENGAGEMENTS_COLUMN,
            impressions: None,
        };
    };

    let url = sheet
        .find_column(HEADER_ROW, URL_HEADER)
        .unwrap_or(DEFAULT_URL_COLUMN);
    let publish_date = sheet
        .find_column(HEADER_ROW, PUBLISH_DATE_HEADER)
        .unwrap_or(DEFAULT_PUBLISH_DATE_COLUMN);

    let impressions = sheet
        .find_column(HEADER_ROW, IMPRESSIONS_HEADER)
        .map(|column| match nearest_url_column_before(sheet, column) {
            Some(block_url) if block_url != url => ImpressionsSource::ByUrl {
                url_column: block_url,
                column,
            },
            _ => ImpressionsSource::SameRow { column },
        });

    Layout {
        url,
        publish_date,
        engagements,
        impressions,
    }
}

/// The closest `Post URL` header strictly left of `column`.
fn nearest_url_column_before(sheet: &Sheet, column: usize) -> Option<usize> {
    (1..column)
        .rev()
        .find(|&col| sheet.cell(HEADER_ROW, col).matches_header(URL_HEADER))
}

fn collect_impressions(sheet: &Sheet, url_column: usize, column: usize) -> HashMap<String, f64> {
    let mut lookup = HashMap::new();
    for row in FIRST_DATA_ROW..=sheet.max_row() {
        let url = sheet.cell(row, url_column).display_text().trim().to_owned();
        if url.is_empty() {
            continue;
        }
        if let Some(value) = read_impressions(sheet, row, column) {
            lookup.entry(url).or_insert(value);
        }
    }
    lookup
}

fn read_impressions(sheet: &Sheet, row: usize, column: usize) -> Option<f64> {
    let cell = sheet.cell(row, column);
    if cell.is_blank() {
        return None;
    }
    match parse_float(cell) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                sheet = TOP_POSTS_SHEET,
                row,
                field = IMPRESSIONS_HEADER,
                error = %e,
                "unreadable impressions; defaulting to 0"
            );
            None
        }
    }
}
