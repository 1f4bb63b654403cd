use crate::history::HistoryResolver;
use staleloc_core::{DiffExcerpt, FreshnessError, RevisionRecord};
use staleloc_provider_api::DiffProvider;
use std::sync::Arc;

/// Maximum number of diff lines kept in an excerpt.
pub const SNIPPET_LINE_CAP: usize = 80;

/// Builds the diff excerpt attached to a report. Best effort: every failure
/// degrades to an excerpt that only links to the file.
#[derive(Clone)]
pub struct DiffSummarizer {
    history: HistoryResolver,
    diffs: Arc<dyn DiffProvider>,
    line_cap: usize,
}

impl DiffSummarizer {
    pub fn new(history: HistoryResolver, diffs: Arc<dyn DiffProvider>) -> Self {
        Self {
            history,
            diffs,
            line_cap: SNIPPET_LINE_CAP,
        }
    }

    pub fn summarize(&self, branch: &str, path: &str) -> DiffExcerpt {
        match self.try_summarize(branch, path) {
            Ok(excerpt) => excerpt,
            Err(err) => {
                tracing::warn!(event = "diff_unavailable", path = %path, branch = %branch, error = %err);
                DiffExcerpt::unavailable(self.history.repo().blob_url(branch, path))
            }
        }
    }

    fn try_summarize(&self, branch: &str, path: &str) -> Result<DiffExcerpt, FreshnessError> {
        let unavailable = |message: &str| FreshnessError::DiffUnavailable {
            path: path.to_string(),
            message: message.to_string(),
        };
        let revs = self
            .history
            .recent(branch, path, 2)
            .ok_or_else(|| unavailable("no revisions"))?;
        let (head, base) = match revs.as_slice() {
            [head, base, ..] => (head, Some(base.revision_id.clone())),
            [head] => (head, self.parent_of(head).map_err(|e| unavailable(&e.to_string()))?),
            [] => return Err(unavailable("no revisions")),
        };

        let patch = self
            .diffs
            .compare_revisions(self.history.repo(), base.as_deref(), &head.revision_id, path)
            .map_err(|e| unavailable(&e.to_string()))?;
        let (text_snippet, is_truncated) = truncate_lines(&patch, self.line_cap);

        let compare_url = match base.as_deref() {
            Some(base) => self.history.repo().compare_url(base, &head.revision_id),
            None => head.view_url.clone(),
        };
        Ok(DiffExcerpt {
            base_revision_id: base,
            head_revision_id: Some(head.revision_id.clone()),
            compare_url,
            text_snippet,
            is_truncated,
        })
    }

    fn parent_of(&self, head: &RevisionRecord) -> staleloc_core::Result<Option<String>> {
        self.history.parent_of(&head.revision_id)
    }
}

/// Keep at most `cap` lines. Returns `(None, false)` for an empty patch.
pub fn truncate_lines(patch: &str, cap: usize) -> (Option<String>, bool) {
    if patch.trim().is_empty() {
        return (None, false);
    }
    let lines: Vec<&str> = patch.lines().collect();
    if lines.len() > cap {
        (Some(lines[..cap].join("\n")), true)
    } else {
        (Some(lines.join("\n")), false)
    }
}
