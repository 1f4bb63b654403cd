//! Machine-readable output shapes of the CLI. Kept flat and string-typed so
//! the published JSON Schemas stay stable across internal refactors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use staleloc_core::{FileReportBundle, LanguageEntry, LanguageStatus};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LanguageOut {
    pub language: String,
    pub state: String,
    pub source_revision: Option<String>,
    pub translation_revision: Option<String>,
    pub expected_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BundleOut {
    pub schema_version: u32,
    pub source_path: String,
    pub source_revision: Option<String>,
    pub outdated: Vec<LanguageOut>,
    pub missing: Vec<LanguageOut>,
    pub current: Vec<LanguageOut>,
    pub compare_url: Option<String>,
    pub diff_truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailureOut {
    pub path: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SummaryOut {
    pub files_checked: usize,
    pub bundles: usize,
    pub published: usize,
    pub outdated: usize,
    pub missing: usize,
    pub current: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub schema_version: u32,
    pub branch: String,
    pub dry_run: bool,
    pub summary: SummaryOut,
    pub bundles: Vec<BundleOut>,
    pub failures: Vec<FailureOut>,
}

impl From<&LanguageEntry> for LanguageOut {
    fn from(e: &LanguageEntry) -> Self {
        let (source_revision, translation_revision, expected_path) = match &e.status {
            LanguageStatus::UpToDate {
                translation_revision,
            } => (None, Some(translation_revision.revision_id.clone()), None),
            LanguageStatus::Outdated {
                source_revision,
                translation_revision,
            } => (
                Some(source_revision.revision_id.clone()),
                Some(translation_revision.revision_id.clone()),
                None,
            ),
            LanguageStatus::Missing { expected_path } => (None, None, Some(expected_path.clone())),
        };
        LanguageOut {
            language: e.language.clone(),
            state: e.status.label().to_string(),
            source_revision,
            translation_revision,
            expected_path,
        }
    }
}

impl From<&FileReportBundle> for BundleOut {
    fn from(b: &FileReportBundle) -> Self {
        BundleOut {
            schema_version: SCHEMA_VERSION,
            source_path: b.source_path.clone(),
            source_revision: b.source_revision.as_ref().map(|r| r.revision_id.clone()),
            outdated: b.outdated.iter().map(LanguageOut::from).collect(),
            missing: b.missing.iter().map(LanguageOut::from).collect(),
            current: b.current.iter().map(LanguageOut::from).collect(),
            compare_url: b.diff.as_ref().map(|d| d.compare_url.clone()),
            diff_truncated: b.diff.as_ref().map(|d| d.is_truncated).unwrap_or(false),
        }
    }
}
