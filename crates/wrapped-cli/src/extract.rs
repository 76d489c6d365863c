//! Command handlers for `extract` and `sheets`.
//!
//! Both read the whole file up front and apply the same file-kind check the
//! upload endpoint applies before decoding.

use std::path::Path;

use anyhow::Context;
use uuid::Uuid;
use wrapped_core::AnalyticsBundle;
use wrapped_extract::{extract_bundle, FileKind, Workbook};

use crate::Section;

fn read_export(path: &Path) -> anyhow::Result<Vec<u8>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if FileKind::from_file_name(name).is_none() {
        anyhow::bail!(
            "unsupported file type '{}': expected an .xlsx or .csv export",
            path.display()
        );
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Extracts a bundle from `path` and renders the requested section as JSON.
///
/// # Errors
///
/// Returns an error if the file type is unsupported, the file cannot be read
/// or decoded, or serialization fails.
pub(crate) fn run_extract(path: &Path, section: Section, compact: bool) -> anyhow::Result<String> {
    let bytes = read_export(path)?;
    let file_id = Uuid::new_v4();
    let bundle = extract_bundle(&bytes, file_id)
        .with_context(|| format!("failed to extract {}", path.display()))?;
    tracing::debug!(path = %path.display(), %file_id, empty = bundle.is_empty(), "extracted bundle");

    let value = section_value(&bundle, section)?;
    let rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(rendered)
}

/// Lists the sheet names in `path`, in workbook order.
///
/// # Errors
///
/// Returns an error if the file type is unsupported or the file cannot be
/// read or decoded.
pub(crate) fn run_sheets(path: &Path) -> anyhow::Result<Vec<String>> {
    let bytes = read_export(path)?;
    let workbook = Workbook::from_bytes(&bytes)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(workbook
        .sheet_names()
        .into_iter()
        .map(str::to_owned)
        .collect())
}

fn section_value(bundle: &AnalyticsBundle, section: Section) -> serde_json::Result<serde_json::Value> {
    match section {
        Section::All => serde_json::to_value(bundle),
        Section::Discovery => serde_json::to_value(&bundle.discovery),
        Section::TopPosts => serde_json::to_value(&bundle.top_posts),
        Section::Demographics => serde_json::to_value(&bundle.demographics),
    }
}
