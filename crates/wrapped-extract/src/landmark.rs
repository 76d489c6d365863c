//! Exact, case-sensitive names of the sheets the export always contains.

pub const DISCOVERY_SHEET: &str = "DISCOVERY";
pub const ENGAGEMENT_SHEET: &str = "ENGAGEMENT";
pub const FOLLOWERS_SHEET: &str = "FOLLOWERS";
pub const DEMOGRAPHICS_SHEET: &str = "DEMOGRAPHICS";
pub const TOP_POSTS_SHEET: &str = "TOP POSTS";
