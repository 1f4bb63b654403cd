use staleloc_core::{FreshnessError, RepoRef, Result, RevisionRecord};
use staleloc_provider_api::HistoryProvider;
use std::sync::Arc;

/// History lookups with branch fallback and failure containment.
///
/// The resolver holds no per-run state: the branch is passed on every call,
/// so one instance can serve concurrent lookups.
#[derive(Clone)]
pub struct HistoryResolver {
    provider: Arc<dyn HistoryProvider>,
    repo: RepoRef,
}

impl HistoryResolver {
    pub fn new(provider: Arc<dyn HistoryProvider>, repo: RepoRef) -> Self {
        Self { provider, repo }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Latest change to `path` on `branch`. Never fails: provider errors are
    /// logged and end in `None`, the same answer as a path without history.
    pub fn resolve_latest(&self, branch: &str, path: &str) -> Option<RevisionRecord> {
        self.recent(branch, path, 1)
            .and_then(|revs| revs.into_iter().next())
    }

    /// Up to `limit` newest changes to `path`. `Some` is never empty.
    pub fn recent(&self, branch: &str, path: &str, limit: usize) -> Option<Vec<RevisionRecord>> {
        match self.attempt(branch, path, limit) {
            Ok(revs) => non_empty(revs),
            Err(err) => {
                tracing::warn!(event = "history_lookup_failed", kind = err.kind(), error = %err);
                let fallback = self.repo.default_branch.as_str();
                if branch == fallback {
                    return None;
                }
                tracing::debug!(event = "history_fallback", path = %path, from = %branch, to = %fallback);
                match self.attempt(fallback, path, limit) {
                    Ok(revs) => non_empty(revs),
                    Err(err) => {
                        tracing::warn!(
                            event = "history_lookup_failed",
                            kind = err.kind(),
                            fallback = true,
                            error = %err
                        );
                        None
                    }
                }
            }
        }
    }

    fn attempt(
        &self,
        branch: &str,
        path: &str,
        limit: usize,
    ) -> std::result::Result<Vec<RevisionRecord>, FreshnessError> {
        self.provider
            .list_revisions(&self.repo, branch, path, limit)
            .map_err(|e| FreshnessError::HistoryLookup {
                path: path.to_string(),
                branch: branch.to_string(),
                message: format!("{e:#}"),
            })
    }

    /// Parent of `revision_id`; errors are returned so callers can degrade.
    pub fn parent_of(&self, revision_id: &str) -> Result<Option<String>> {
        self.provider.parent_revision(&self.repo, revision_id)
    }
}

fn non_empty(revs: Vec<RevisionRecord>) -> Option<Vec<RevisionRecord>> {
    if revs.is_empty() {
        None
    } else {
        Some(revs)
    }
}
