use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Date-ranged discovery metrics for one export.
///
/// The three optional fields are derived from other sheets and stay `None`
/// when those sheets are missing or unparseable. `None` never stands in for
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_impressions: i64,
    pub members_reached: i64,
    pub total_engagements: Option<i64>,
    pub average_impressions_per_day: Option<f64>,
    /// Net change over the period; negative when followers were lost.
    pub new_followers: Option<i64>,
}

impl DiscoveryRecord {
    /// Returns `true` when the engagement-derived metrics were merged in.
    #[must_use]
    pub fn has_summary_metrics(&self) -> bool {
        self.total_engagements.is_some()
            && self.average_impressions_per_day.is_some()
            && self.new_followers.is_some()
    }
}

/// One row of the ranked top-posts list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPostRecord {
    /// 1-based, contiguous within one file.
    pub rank: u32,
    /// May be empty when the source cell was blank.
    pub url: String,
    /// Kept exactly as the export wrote it, e.g. `"11/3/2025"`.
    pub publish_date: String,
    pub engagements: f64,
    /// `0.0` when the export has no impressions figure for the post.
    pub impressions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicEntry {
    pub name: String,
    /// Passed through unclamped; out-of-range values signal a source anomaly.
    pub percentage: f64,
}

/// The fixed set of audience categories the export reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicCategory {
    JobTitles,
    Locations,
    Industries,
    Seniority,
    CompanySize,
    Companies,
}

impl DemographicCategory {
    pub const ALL: [DemographicCategory; 6] = [
        DemographicCategory::JobTitles,
        DemographicCategory::Locations,
        DemographicCategory::Industries,
        DemographicCategory::Seniority,
        DemographicCategory::CompanySize,
        DemographicCategory::Companies,
    ];

    /// The label used in the export's category column.
    #[must_use]
    pub fn source_label(self) -> &'static str {
        match self {
            DemographicCategory::JobTitles => "Job titles",
            DemographicCategory::Locations => "Locations",
            DemographicCategory::Industries => "Industries",
            DemographicCategory::Seniority => "Seniority",
            DemographicCategory::CompanySize => "Company size",
            DemographicCategory::Companies => "Companies",
        }
    }

    /// Matches an export label exactly (case-sensitive, no trimming).
    #[must_use]
    pub fn from_source_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.source_label() == label)
    }

    /// The key used when the record is serialized.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            DemographicCategory::JobTitles => "job_titles",
            DemographicCategory::Locations => "locations",
            DemographicCategory::Industries => "industries",
            DemographicCategory::Seniority => "seniority",
            DemographicCategory::CompanySize => "company_size",
            DemographicCategory::Companies => "companies",
        }
    }
}

impl std::fmt::Display for DemographicCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source_label())
    }
}

/// Audience demographics grouped by category.
///
/// Every category is always present; a category with no rows in the export
/// holds an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsRecord {
    pub job_titles: Vec<DemographicEntry>,
    pub locations: Vec<DemographicEntry>,
    pub industries: Vec<DemographicEntry>,
    pub seniority: Vec<DemographicEntry>,
    pub company_size: Vec<DemographicEntry>,
    pub companies: Vec<DemographicEntry>,
}

impl DemographicsRecord {
    #[must_use]
    pub fn entries(&self, category: DemographicCategory) -> &[DemographicEntry] {
        match category {
            DemographicCategory::JobTitles => &self.job_titles,
            DemographicCategory::Locations => &self.locations,
            DemographicCategory::Industries => &self.industries,
            DemographicCategory::Seniority => &self.seniority,
            DemographicCategory::CompanySize => &self.company_size,
            DemographicCategory::Companies => &self.companies,
        }
    }

    pub fn entries_mut(&mut self, category: DemographicCategory) -> &mut Vec<DemographicEntry> {
        match category {
            DemographicCategory::JobTitles => &mut self.job_titles,
            DemographicCategory::Locations => &mut self.locations,
            DemographicCategory::Industries => &mut self.industries,
            DemographicCategory::Seniority => &mut self.seniority,
            DemographicCategory::CompanySize => &mut self.company_size,
            DemographicCategory::Companies => &mut self.companies,
        }
    }

    /// Iterates all six categories in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (DemographicCategory, &[DemographicEntry])> {
        DemographicCategory::ALL
            .into_iter()
            .map(move |c| (c, self.entries(c)))
    }

    /// Total number of entries across all categories.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.iter().map(|(_, entries)| entries.len()).sum()
    }
}

/// Everything salvaged from one uploaded export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsBundle {
    pub file_id: Uuid,
    pub discovery: Option<DiscoveryRecord>,
    pub top_posts: Option<Vec<TopPostRecord>>,
    pub demographics: Option<DemographicsRecord>,
}

impl AnalyticsBundle {
    /// A bundle with nothing extracted yet.
    #[must_use]
    pub fn empty(file_id: Uuid) -> Self {
        Self {
            file_id,
            discovery: None,
            top_posts: None,
            demographics: None,
        }
    }

    /// Returns `true` when no extractor produced a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discovery.is_none() && self.top_posts.is_none() && self.demographics.is_none()
    }
}
