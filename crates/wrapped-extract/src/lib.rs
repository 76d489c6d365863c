//! Extraction of typed analytics records from a content-performance export.
//!
//! [`extract_bundle`] is the entry point: it decodes the uploaded bytes into a
//! [`Workbook`] and runs every sheet extractor, keeping whatever succeeds.

pub mod demographics;
pub mod discovery;
pub mod error;
pub mod landmark;
pub mod normalize;
pub mod orchestrator;
pub mod summary;
pub mod top_posts;
pub mod workbook;

pub use demographics::parse_demographics_sheet;
pub use discovery::{extract_discovery, extract_discovery_data, read_discovery_cells};
pub use error::ExtractError;
pub use normalize::{parse_date_range, parse_float, parse_integer, parse_percentage};
pub use orchestrator::{assemble_bundle, extract_bundle};
pub use summary::{
    calculate_summary_metrics, get_average_daily_impressions, get_new_followers,
    get_total_engagements, SummaryMetrics, SummaryMetricsExtractor,
};
pub use top_posts::{extract_top_posts, parse_top_posts_sheet, take_top_posts, TOP_POSTS_LIMIT};
pub use workbook::{FileKind, RawCellValue, Sheet, Workbook};
