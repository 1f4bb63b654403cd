use crate::diff::DiffSummarizer;
use crate::freshness::classify;
use crate::history::HistoryResolver;
use crate::paths::PathMapper;
use rayon::prelude::*;
use staleloc_core::{FileReportBundle, FreshnessError, LanguageEntry, LanguageStatus};
use staleloc_provider_api::FileOracle;
use std::sync::Arc;

/// Per-status language counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub outdated: usize,
    pub missing: usize,
    pub current: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn add(&mut self, other: StatusCounts) {
        self.outdated += other.outdated;
        self.missing += other.missing;
        self.current += other.current;
        self.skipped += other.skipped;
    }
}

/// Result of evaluating one source file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source_path: String,
    pub counts: StatusCounts,
    /// `None` when every evaluated translation is current.
    pub bundle: Option<FileReportBundle>,
}

/// Configured languages in order with repeats and the source locale removed,
/// so a language lands in at most one partition of a bundle.
pub fn target_languages(source_locale: &str, languages: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(languages.len());
    for lang in languages {
        if lang == source_locale || out.contains(lang) {
            continue;
        }
        out.push(lang.clone());
    }
    out
}

enum LanguageOutcome {
    Classified(LanguageEntry),
    Skipped,
}

/// Collects the classifications of every configured language for a single
/// source file.
#[derive(Clone)]
pub struct FileReportAggregator {
    mapper: PathMapper,
    history: HistoryResolver,
    oracle: Arc<dyn FileOracle>,
    diffs: DiffSummarizer,
}

impl FileReportAggregator {
    pub fn new(
        mapper: PathMapper,
        history: HistoryResolver,
        oracle: Arc<dyn FileOracle>,
        diffs: DiffSummarizer,
    ) -> Self {
        Self {
            mapper,
            history,
            oracle,
            diffs,
        }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Evaluate `source_path` against `languages` on `branch`. Languages are
    /// looked up in parallel on the current rayon pool; the bundle keeps the
    /// configured language order.
    pub fn evaluate(
        &self,
        branch: &str,
        source_path: &str,
        languages: &[String],
    ) -> Result<FileOutcome, FreshnessError> {
        if !self.mapper.is_source_path(source_path) {
            return Err(FreshnessError::InvalidPath {
                path: source_path.to_string(),
                locale: self.mapper.source_locale().to_string(),
            });
        }

        let source_revision = self.history.resolve_latest(branch, source_path);
        if source_revision.is_none() {
            tracing::debug!(event = "source_history_unavailable", path = %source_path, branch = %branch);
        }

        let languages = target_languages(self.mapper.source_locale(), languages);
        let outcomes: Vec<LanguageOutcome> = languages
            .par_iter()
            .map(|lang| self.evaluate_language(branch, source_path, lang, source_revision.as_ref()))
            .collect();

        let mut counts = StatusCounts::default();
        let mut entries = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                LanguageOutcome::Classified(entry) => {
                    match entry.status {
                        LanguageStatus::Outdated { .. } => counts.outdated += 1,
                        LanguageStatus::Missing { .. } => counts.missing += 1,
                        LanguageStatus::UpToDate { .. } => counts.current += 1,
                    }
                    entries.push(entry);
                }
                LanguageOutcome::Skipped => counts.skipped += 1,
            }
        }

        let bundle = FileReportBundle::assemble(source_path, source_revision, entries);
        if !bundle.needs_notice() {
            tracing::debug!(event = "file_current", path = %source_path, current = counts.current, skipped = counts.skipped);
            return Ok(FileOutcome {
                source_path: source_path.to_string(),
                counts,
                bundle: None,
            });
        }

        let diff = self.diffs.summarize(branch, source_path);
        Ok(FileOutcome {
            source_path: source_path.to_string(),
            counts,
            bundle: Some(bundle.with_diff(diff)),
        })
    }

    fn evaluate_language(
        &self,
        branch: &str,
        source_path: &str,
        language: &str,
        source_revision: Option<&staleloc_core::RevisionRecord>,
    ) -> LanguageOutcome {
        let translated = match self.mapper.derive_translation_path(source_path, language) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(event = "translation_path_invalid", path = %source_path, lang = %language, error = %err);
                return LanguageOutcome::Skipped;
            }
        };
        let exists = self.oracle.exists(&translated);
        let translation_revision = if exists {
            self.history.resolve_latest(branch, &translated)
        } else {
            None
        };
        match classify(source_path, source_revision, exists, translation_revision.as_ref(), &translated) {
            Ok(status) => {
                tracing::debug!(event = "language_classified", path = %source_path, lang = %language, status = status.label());
                LanguageOutcome::Classified(LanguageEntry::new(language, status))
            }
            Err(err) => {
                tracing::info!(event = "language_skipped", path = %source_path, lang = %language, reason = %err);
                LanguageOutcome::Skipped
            }
        }
    }
}
