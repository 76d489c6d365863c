use std::collections::BTreeSet;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("sheet \"{sheet}\" not found in workbook")]
    SheetNotFound { sheet: String },

    #[error("missing required fields in sheet \"{sheet}\": {}", join_fields(.fields))]
    MissingField {
        sheet: String,
        fields: BTreeSet<String>,
    },

    #[error("cannot normalize value \"{value}\": {reason}")]
    Normalization { value: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unreadable file: {0}")]
    UnreadableFile(String),
}

impl ExtractError {
    pub(crate) fn sheet_not_found(sheet: &str) -> Self {
        Self::SheetNotFound {
            sheet: sheet.to_owned(),
        }
    }

    pub(crate) fn missing_field(sheet: &str, field: &str) -> Self {
        Self::MissingField {
            sheet: sheet.to_owned(),
            fields: BTreeSet::from([field.to_owned()]),
        }
    }

    pub(crate) fn normalization(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Normalization {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

fn join_fields(fields: &BTreeSet<String>) -> String {
    fields
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
