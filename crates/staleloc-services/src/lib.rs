//! Freshness engine: path mapping, history resolution, classification,
//! per-file aggregation and batch orchestration, plus the concrete providers
//! the CLI wires in. Callers hold only trait objects from
//! `staleloc-provider-api`, so any layer can be swapped for tests.

pub mod aggregate;
pub mod branch;
pub mod diff;
pub mod discover;
pub mod freshness;
pub mod fs;
pub mod github;
pub mod history;
pub mod local_git;
pub mod notice;
pub mod orchestrator;
pub mod paths;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::{target_languages, FileOutcome, FileReportAggregator, StatusCounts};
pub use branch::{resolve_branch, resolve_branch_with};
pub use diff::{DiffSummarizer, SNIPPET_LINE_CAP};
pub use discover::discover_source_files;
pub use freshness::classify;
pub use fs::{FsOracle, JsonDirSink};
pub use github::GitHubClient;
pub use history::HistoryResolver;
pub use local_git::LocalGitProvider;
pub use notice::{render_notice, NoticeStyle};
pub use orchestrator::{BatchOrchestrator, FileFailure, OrchestratorConfig, RunOutcome, RunSummary};
pub use paths::PathMapper;
pub use staleloc_core::{Result, RepoRef};
