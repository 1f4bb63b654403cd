//! Capability traits the freshness engine consumes.
//! Concrete transports (GitHub REST, local git) live in `staleloc-services`;
//! tests plug in in-memory implementations.

use color_eyre::eyre::Result;
use staleloc_core::{FileReportBundle, Notice, RepoRef, RevisionRecord};

/// Version history of individual files.
pub trait HistoryProvider: Send + Sync {
    /// Most recent changes to `path` reachable from `branch`, newest first,
    /// at most `limit` records. An empty vector means the path has no history.
    fn list_revisions(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RevisionRecord>>;

    /// First parent of a revision, `None` for a root revision.
    fn parent_revision(&self, repo: &RepoRef, revision_id: &str) -> Result<Option<String>>;
}

/// Textual diffs between two revisions.
pub trait DiffProvider: Send + Sync {
    /// Unified diff of `path` between `base` and `head`. A `None` base diffs
    /// against an empty tree.
    fn compare_revisions(
        &self,
        repo: &RepoRef,
        base: Option<&str>,
        head: &str,
        path: &str,
    ) -> Result<String>;
}

/// Local existence check for translated files. Paths are relative to the
/// content root.
pub trait FileOracle: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Destination for rendered reports. Deduplication of repeated notices is the
/// sink's concern.
pub trait NoticeSink: Send + Sync {
    fn name(&self) -> &'static str;
    fn publish(&self, bundle: &FileReportBundle, notice: &Notice) -> Result<()>;
}
