use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// One historical change to a file as reported by a history provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    /// Opaque identifier, usually a commit SHA.
    pub revision_id: String,
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    /// First line (or full text) of the change message.
    pub summary_text: String,
    /// Locator for humans, e.g. the commit page.
    pub view_url: String,
}

impl RevisionRecord {
    pub fn new(
        revision_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        author_name: impl Into<String>,
        summary_text: impl Into<String>,
        view_url: impl Into<String>,
    ) -> Self {
        Self {
            revision_id: revision_id.into(),
            timestamp,
            author_name: author_name.into(),
            summary_text: summary_text.into(),
            view_url: view_url.into(),
        }
    }

    /// Abbreviated identifier for display (first 7 chars).
    pub fn short_id(&self) -> &str {
        let end = self
            .revision_id
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.revision_id.len());
        &self.revision_id[..end]
    }
}

/// Freshness of one translation relative to its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LanguageStatus {
    UpToDate {
        translation_revision: RevisionRecord,
    },
    Outdated {
        source_revision: RevisionRecord,
        translation_revision: RevisionRecord,
    },
    Missing {
        expected_path: String,
    },
}

impl LanguageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LanguageStatus::UpToDate { .. } => "up-to-date",
            LanguageStatus::Outdated { .. } => "outdated",
            LanguageStatus::Missing { .. } => "missing",
        }
    }

    pub fn needs_attention(&self) -> bool {
        !matches!(self, LanguageStatus::UpToDate { .. })
    }
}

/// A target language paired with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub status: LanguageStatus,
}

impl LanguageEntry {
    pub fn new(language: impl Into<String>, status: LanguageStatus) -> Self {
        Self {
            language: language.into(),
            status,
        }
    }
}

/// Bounded diff excerpt attached to a report.
///
/// `base_revision_id == None` with a head present means the file had no prior
/// revision. Both `None` means history was unavailable and `compare_url` only
/// points at the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffExcerpt {
    pub base_revision_id: Option<String>,
    pub head_revision_id: Option<String>,
    pub compare_url: String,
    pub text_snippet: Option<String>,
    pub is_truncated: bool,
}

impl DiffExcerpt {
    /// Excerpt used when no history or diff could be obtained.
    pub fn unavailable(compare_url: impl Into<String>) -> Self {
        Self {
            base_revision_id: None,
            head_revision_id: None,
            compare_url: compare_url.into(),
            text_snippet: None,
            is_truncated: false,
        }
    }
}

/// All per-language findings for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReportBundle {
    pub source_path: String,
    pub source_revision: Option<RevisionRecord>,
    pub outdated: Vec<LanguageEntry>,
    pub missing: Vec<LanguageEntry>,
    pub current: Vec<LanguageEntry>,
    pub diff: Option<DiffExcerpt>,
}

impl FileReportBundle {
    /// Partition classified entries by variant, keeping their relative order.
    pub fn assemble(
        source_path: impl Into<String>,
        source_revision: Option<RevisionRecord>,
        entries: Vec<LanguageEntry>,
    ) -> Self {
        let mut outdated = Vec::new();
        let mut missing = Vec::new();
        let mut current = Vec::new();
        for entry in entries {
            match entry.status {
                LanguageStatus::Outdated { .. } => outdated.push(entry),
                LanguageStatus::Missing { .. } => missing.push(entry),
                LanguageStatus::UpToDate { .. } => current.push(entry),
            }
        }
        Self {
            source_path: source_path.into(),
            source_revision,
            outdated,
            missing,
            current,
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: DiffExcerpt) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Fully current files are never reported.
    pub fn needs_notice(&self) -> bool {
        !self.outdated.is_empty() || !self.missing.is_empty()
    }

    /// Languages needing work: outdated first, then missing.
    pub fn affected_languages(&self) -> impl Iterator<Item = &str> {
        self.outdated
            .iter()
            .chain(self.missing.iter())
            .map(|e| e.language.as_str())
    }
}

/// Repository coordinates plus the URL scheme of its web frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub web_base: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            default_branch: "main".to_string(),
            web_base: "https://github.com".to_string(),
        }
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    pub fn with_web_base(mut self, base: impl Into<String>) -> Self {
        self.web_base = base.into();
        self
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    fn web_root(&self) -> String {
        format!(
            "{}/{}/{}",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }

    pub fn commit_url(&self, revision_id: &str) -> String {
        format!("{}/commit/{}", self.web_root(), revision_id)
    }

    pub fn compare_url(&self, base: &str, head: &str) -> String {
        format!("{}/compare/{}...{}", self.web_root(), base, head)
    }

    pub fn blob_url(&self, branch: &str, path: &str) -> String {
        format!("{}/blob/{}/{}", self.web_root(), branch, path)
    }
}

/// Rendered form of a bundle, ready for a notice sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Domain failures. Only `InvalidPath` and `Sink` ever reach the caller of a
/// batch run; the others are contained where they occur.
#[derive(Debug, Error)]
pub enum FreshnessError {
    #[error("path `{path}` has no `{locale}` segment")]
    InvalidPath { path: String, locale: String },
    #[error("history lookup for `{path}` on `{branch}` failed: {message}")]
    HistoryLookup {
        path: String,
        branch: String,
        message: String,
    },
    #[error("diff for `{path}` unavailable: {message}")]
    DiffUnavailable { path: String, message: String },
    #[error("source revision of `{path}` could not be resolved")]
    AmbiguousSource { path: String },
    #[error("publishing notice for `{path}` failed: {message}")]
    Sink { path: String, message: String },
}

impl FreshnessError {
    /// Short machine-readable kind used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            FreshnessError::InvalidPath { .. } => "path",
            FreshnessError::HistoryLookup { .. } => "history",
            FreshnessError::DiffUnavailable { .. } => "diff",
            FreshnessError::AmbiguousSource { .. } => "ambiguous-source",
            FreshnessError::Sink { .. } => "sink",
        }
    }
}
