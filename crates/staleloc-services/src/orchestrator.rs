use crate::aggregate::{target_languages, FileOutcome, FileReportAggregator, StatusCounts};
use crate::notice::{render_notice, NoticeStyle};
use color_eyre::eyre::eyre;
use rayon::prelude::*;
use staleloc_core::{FileReportBundle, FreshnessError, Result};
use staleloc_provider_api::NoticeSink;
use std::collections::HashSet;
use std::sync::Arc;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Target languages in reporting order.
    pub languages: Vec<String>,
    /// Branch for first-attempt history lookups, resolved once per run.
    pub branch: String,
    /// Produce bundles without handing them to the sink.
    pub dry_run: bool,
    /// Upper bound on concurrently running lookups.
    pub concurrency: usize,
    pub notice: NoticeStyle,
}

impl OrchestratorConfig {
    pub fn new(languages: Vec<String>, branch: impl Into<String>) -> Self {
        Self {
            languages,
            branch: branch.into(),
            dry_run: false,
            concurrency: DEFAULT_CONCURRENCY,
            notice: NoticeStyle::default(),
        }
    }
}

/// A file-level operation that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub kind: String,
    pub message: String,
}

impl From<&FreshnessError> for FileFailure {
    fn from(err: &FreshnessError) -> Self {
        let path = match err {
            FreshnessError::InvalidPath { path, .. }
            | FreshnessError::HistoryLookup { path, .. }
            | FreshnessError::DiffUnavailable { path, .. }
            | FreshnessError::AmbiguousSource { path }
            | FreshnessError::Sink { path, .. } => path.clone(),
        };
        FileFailure {
            path,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files_checked: usize,
    pub bundles: usize,
    pub published: usize,
    pub counts: StatusCounts,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Bundles in input order.
    pub bundles: Vec<FileReportBundle>,
    pub summary: RunSummary,
}

struct FileResult {
    outcome: Option<FileOutcome>,
    published: bool,
    failure: Option<FileFailure>,
}

/// Drives a stateless pass over a batch of source files: evaluate each file,
/// publish every non-empty bundle, summarize.
pub struct BatchOrchestrator {
    aggregator: FileReportAggregator,
    sink: Arc<dyn NoticeSink>,
    config: OrchestratorConfig,
    pool: rayon::ThreadPool,
}

impl BatchOrchestrator {
    pub fn new(
        aggregator: FileReportAggregator,
        sink: Arc<dyn NoticeSink>,
        mut config: OrchestratorConfig,
    ) -> Result<Self> {
        let source_locale = aggregator.mapper().source_locale().to_string();
        let targets = target_languages(&source_locale, &config.languages);
        if targets.len() != config.languages.len() {
            tracing::warn!(
                event = "languages_normalized",
                source_locale = %source_locale,
                configured = ?config.languages,
                used = ?targets,
                "repeated languages and the source locale are ignored"
            );
            config.languages = targets;
        }
        let threads = config.concurrency.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("staleloc-worker-{i}"))
            .build()
            .map_err(|e| eyre!("cannot start worker pool: {e}"))?;
        Ok(Self {
            aggregator,
            sink,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Evaluate `files` (canonical-locale paths relative to the repository root).
    /// Failures are isolated per file and collected in the summary.
    pub fn run(&self, files: &[String]) -> RunOutcome {
        let mut seen = HashSet::new();
        let inputs: Vec<&String> = files
            .iter()
            .filter(|p| {
                let fresh = seen.insert(p.as_str());
                if !fresh {
                    tracing::debug!(event = "duplicate_input", path = %p);
                }
                fresh
            })
            .collect();

        tracing::info!(
            event = "run_started",
            files = inputs.len(),
            languages = self.config.languages.len(),
            branch = %self.config.branch,
            dry_run = self.config.dry_run,
            sink = self.sink.name()
        );

        let results: Vec<FileResult> = self
            .pool
            .install(|| inputs.par_iter().map(|p| self.process(p)).collect());

        let mut outcome = RunOutcome::default();
        outcome.summary.files_checked = inputs.len();
        for result in results {
            if let Some(file) = result.outcome {
                outcome.summary.counts.add(file.counts);
                if let Some(bundle) = file.bundle {
                    outcome.bundles.push(bundle);
                }
            }
            if result.published {
                outcome.summary.published += 1;
            }
            if let Some(failure) = result.failure {
                outcome.summary.failures.push(failure);
            }
        }
        outcome.summary.bundles = outcome.bundles.len();

        let s = &outcome.summary;
        tracing::info!(
            event = "run_finished",
            files = s.files_checked,
            bundles = s.bundles,
            published = s.published,
            outdated = s.counts.outdated,
            missing = s.counts.missing,
            current = s.counts.current,
            skipped = s.counts.skipped,
            failures = s.failures.len()
        );
        outcome
    }

    fn process(&self, path: &str) -> FileResult {
        let file = match self
            .aggregator
            .evaluate(&self.config.branch, path, &self.config.languages)
        {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(event = "file_skipped", path = %path, error = %err);
                return FileResult {
                    outcome: None,
                    published: false,
                    failure: Some(FileFailure::from(&err)),
                };
            }
        };

        let Some(bundle) = file.bundle.as_ref() else {
            return FileResult {
                outcome: Some(file),
                published: false,
                failure: None,
            };
        };

        if self.config.dry_run {
            tracing::info!(
                event = "dry_run_bundle",
                path = %path,
                outdated = bundle.outdated.len(),
                missing = bundle.missing.len()
            );
            return FileResult {
                outcome: Some(file),
                published: false,
                failure: None,
            };
        }

        let notice = render_notice(bundle, &self.config.notice);
        match self.sink.publish(bundle, &notice) {
            Ok(()) => {
                tracing::info!(event = "notice_published", path = %path, sink = self.sink.name());
                FileResult {
                    outcome: Some(file),
                    published: true,
                    failure: None,
                }
            }
            Err(err) => {
                let err = FreshnessError::Sink {
                    path: path.to_string(),
                    message: format!("{err:#}"),
                };
                tracing::error!(event = "notice_failed", path = %path, error = %err);
                FileResult {
                    outcome: Some(file),
                    published: false,
                    failure: Some(FileFailure::from(&err)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffSummarizer;
    use crate::history::HistoryResolver;
    use crate::paths::PathMapper;
    use crate::test_support::{day, repo, rev, MemoryDiff, MemoryHistory, MemoryOracle, MemorySink};
    use staleloc_core::{RepoRef, RevisionRecord};
    use staleloc_provider_api::{FileOracle, HistoryProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn langs() -> Vec<String> {
        vec!["es".into(), "hi".into()]
    }

    fn orchestrator(
        history: MemoryHistory,
        oracle: MemoryOracle,
        sink: Arc<MemorySink>,
        dry_run: bool,
    ) -> BatchOrchestrator {
        let resolver = HistoryResolver::new(Arc::new(history), repo());
        let aggregator = FileReportAggregator::new(
            PathMapper::new("en"),
            resolver.clone(),
            Arc::new(oracle),
            DiffSummarizer::new(resolver, Arc::new(MemoryDiff::default())),
        );
        let mut config = OrchestratorConfig::new(langs(), "feature");
        config.dry_run = dry_run;
        config.concurrency = 3;
        BatchOrchestrator::new(aggregator, sink, config).unwrap()
    }

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    fn sample_history() -> MemoryHistory {
        MemoryHistory::default()
            .with("feature", "en/a.md", vec![rev("a2", day(2024, 6, 10))])
            .with("feature", "hi/a.md", vec![rev("ah", day(2024, 6, 1))])
            .with("feature", "es/a.md", vec![rev("ae", day(2024, 6, 12))])
            .with("feature", "en/b.md", vec![rev("b1", day(2024, 6, 1))])
            .with("feature", "es/b.md", vec![rev("be", day(2024, 6, 2))])
            .with("feature", "hi/b.md", vec![rev("bh", day(2024, 6, 2))])
            .with("feature", "en/c.md", vec![rev("c1", day(2024, 6, 1))])
    }

    fn sample_oracle() -> MemoryOracle {
        MemoryOracle::default()
            .with("hi/a.md")
            .with("es/a.md")
            .with("es/b.md")
            .with("hi/b.md")
    }

    #[test]
    fn publishes_one_notice_per_file_needing_work() {
        let sink = Arc::new(MemorySink::default());
        let orch = orchestrator(sample_history(), sample_oracle(), sink.clone(), false);
        let out = orch.run(&files(&["en/a.md", "en/b.md", "en/c.md"]));

        assert_eq!(sink.published_paths(), ["en/a.md", "en/c.md"]);
        assert_eq!(out.summary.published, 2);
        assert_eq!(out.summary.bundles, 2);
        assert_eq!(out.summary.files_checked, 3);
        assert_eq!(out.summary.counts.outdated, 1);
        assert_eq!(out.summary.counts.missing, 2);
        assert_eq!(out.summary.counts.current, 3);
        assert!(out.summary.failures.is_empty());

        let a = &out.bundles[0];
        assert_eq!(a.source_path, "en/a.md");
        assert_eq!(a.outdated[0].language, "hi");
        assert_eq!(a.current[0].language, "es");

        let published = sink.published.lock().unwrap();
        let (_, notice) = published
            .iter()
            .find(|(b, _)| b.source_path == "en/c.md")
            .unwrap();
        assert_eq!(notice.labels, ["needs translation", "lang:es", "lang:hi"]);
    }

    #[test]
    fn dry_run_skips_sink() {
        let sink = Arc::new(MemorySink::default());
        let orch = orchestrator(sample_history(), sample_oracle(), sink.clone(), true);
        let out = orch.run(&files(&["en/a.md", "en/b.md", "en/c.md"]));
        assert_eq!(out.bundles.len(), 2);
        assert_eq!(out.summary.published, 0);
        assert!(sink.published_paths().is_empty());
    }

    #[test]
    fn history_outage_for_one_file_leaves_others_intact() {
        let history = sample_history()
            .failing("feature", "en/b.md")
            .failing("main", "en/b.md")
            .failing("feature", "hi/b.md")
            .failing("main", "hi/b.md");
        let sink = Arc::new(MemorySink::default());
        let orch = orchestrator(history, sample_oracle(), sink.clone(), false);
        let out = orch.run(&files(&["en/a.md", "en/b.md", "en/c.md"]));

        let paths: Vec<_> = out.bundles.iter().map(|b| b.source_path.as_str()).collect();
        // b: es skipped (no source revision), hi exists without history -> missing
        assert_eq!(paths, ["en/a.md", "en/b.md", "en/c.md"]);
        let b = &out.bundles[1];
        assert!(b.source_revision.is_none());
        assert_eq!(b.missing[0].language, "hi");
        assert_eq!(out.summary.counts.skipped, 1);
        assert!(out.summary.failures.is_empty());
    }

    #[test]
    fn sink_and_path_failures_are_reported_per_file() {
        let sink = Arc::new(MemorySink::default().failing("en/a.md"));
        let orch = orchestrator(sample_history(), sample_oracle(), sink.clone(), false);
        let out = orch.run(&files(&["en/a.md", "es/x.md", "en/c.md"]));

        assert_eq!(sink.published_paths(), ["en/c.md"]);
        assert_eq!(out.summary.published, 1);
        let kinds: Vec<_> = out
            .summary
            .failures
            .iter()
            .map(|f| (f.path.as_str(), f.kind.as_str()))
            .collect();
        assert_eq!(kinds, [("en/a.md", "sink"), ("es/x.md", "path")]);
        // the bundle whose publication failed is still returned
        assert_eq!(out.bundles.len(), 2);
    }

    #[test]
    fn duplicate_inputs_are_evaluated_once() {
        let sink = Arc::new(MemorySink::default());
        let orch = orchestrator(sample_history(), sample_oracle(), sink.clone(), false);
        let out = orch.run(&files(&["en/c.md", "en/c.md"]));
        assert_eq!(out.summary.files_checked, 1);
        assert_eq!(sink.published_paths(), ["en/c.md"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let sink = Arc::new(MemorySink::default());
        let orch = orchestrator(sample_history(), sample_oracle(), sink, true);
        let input = files(&["en/a.md", "en/b.md", "en/c.md"]);
        let first = orch.run(&input);
        let second = orch.run(&input);
        assert_eq!(first.bundles, second.bundles);
        assert_eq!(first.summary.counts, second.summary.counts);
    }

    /// Answers every lookup after a short delay and records the highest
    /// number of lookups running at the same time.
    #[derive(Default)]
    struct GaugedHistory {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl HistoryProvider for GaugedHistory {
        fn list_revisions(
            &self,
            _repo: &RepoRef,
            _branch: &str,
            _path: &str,
            _limit: usize,
        ) -> Result<Vec<RevisionRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![rev("r1", day(2024, 6, 1))])
        }

        fn parent_revision(&self, _repo: &RepoRef, _revision_id: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct EverythingExists;

    impl FileOracle for EverythingExists {
        fn exists(&self, _path: &str) -> bool {
            true
        }
    }

    #[test]
    fn lookups_in_flight_never_exceed_concurrency() {
        let history = Arc::new(GaugedHistory::default());
        let resolver = HistoryResolver::new(history.clone(), repo());
        let aggregator = FileReportAggregator::new(
            PathMapper::new("en"),
            resolver.clone(),
            Arc::new(EverythingExists),
            DiffSummarizer::new(resolver, Arc::new(MemoryDiff::default())),
        );
        let languages: Vec<String> = ["es", "hi", "ko", "fr"].iter().map(|s| s.to_string()).collect();
        let mut config = OrchestratorConfig::new(languages, "main");
        config.concurrency = 2;
        config.dry_run = true;
        let orch = BatchOrchestrator::new(aggregator, Arc::new(MemorySink::default()), config).unwrap();

        let input: Vec<String> = (0..8).map(|i| format!("en/page-{i}.md")).collect();
        let out = orch.run(&input);

        // one source lookup plus one per language, for every file
        assert_eq!(history.calls.load(Ordering::SeqCst), 8 * 5);
        assert_eq!(out.summary.counts.current, 8 * 4);
        let peak = history.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= orch.config().concurrency, "peak {peak}");
    }

    #[test]
    fn config_languages_drop_repeats_and_source_locale() {
        let resolver = HistoryResolver::new(Arc::new(MemoryHistory::default()), repo());
        let aggregator = FileReportAggregator::new(
            PathMapper::new("en"),
            resolver.clone(),
            Arc::new(MemoryOracle::default()),
            DiffSummarizer::new(resolver, Arc::new(MemoryDiff::default())),
        );
        let languages: Vec<String> = ["hi", "en", "hi", "es"].iter().map(|s| s.to_string()).collect();
        let config = OrchestratorConfig::new(languages, "main");
        let orch = BatchOrchestrator::new(aggregator, Arc::new(MemorySink::default()), config).unwrap();
        assert_eq!(orch.config().languages, ["hi", "es"]);
    }
}
