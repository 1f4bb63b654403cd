//! In-memory providers for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use color_eyre::eyre::{eyre, Result};
use staleloc_core::{FileReportBundle, Notice, RepoRef, RevisionRecord};
use staleloc_provider_api::{DiffProvider, FileOracle, HistoryProvider, NoticeSink};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn repo() -> RepoRef {
    RepoRef::new("octo", "site").with_web_base("https://example.test")
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn rev(id: &str, at: DateTime<Utc>) -> RevisionRecord {
    RevisionRecord::new(id, at, "dev", format!("change {id}"), repo().commit_url(id))
}

#[derive(Default)]
pub struct MemoryHistory {
    revisions: HashMap<(String, String), Vec<RevisionRecord>>,
    failing: HashSet<(String, String)>,
    parents: HashMap<String, Option<String>>,
    pub calls: AtomicUsize,
}

impl MemoryHistory {
    /// Register revisions newest first.
    pub fn with(mut self, branch: &str, path: &str, revs: Vec<RevisionRecord>) -> Self {
        self.revisions.insert((branch.into(), path.into()), revs);
        self
    }

    /// Every lookup of `path` on `branch` fails; `*` matches any path.
    pub fn failing(mut self, branch: &str, path: &str) -> Self {
        self.failing.insert((branch.into(), path.into()));
        self
    }

    pub fn parent(mut self, child: &str, parent: Option<&str>) -> Self {
        self.parents.insert(child.into(), parent.map(str::to_string));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistoryProvider for MemoryHistory {
    fn list_revisions(
        &self,
        _repo: &RepoRef,
        branch: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RevisionRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&(branch.to_string(), path.to_string()))
            || self.failing.contains(&(branch.to_string(), "*".to_string()))
        {
            return Err(eyre!("simulated outage for {branch}:{path}"));
        }
        Ok(self
            .revisions
            .get(&(branch.to_string(), path.to_string()))
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn parent_revision(&self, _repo: &RepoRef, revision_id: &str) -> Result<Option<String>> {
        self.parents
            .get(revision_id)
            .cloned()
            .ok_or_else(|| eyre!("unknown revision {revision_id}"))
    }
}

#[derive(Default)]
pub struct MemoryDiff {
    patches: HashMap<(Option<String>, String, String), String>,
}

impl MemoryDiff {
    pub fn with(mut self, base: Option<&str>, head: &str, path: &str, patch: &str) -> Self {
        self.patches.insert(
            (base.map(str::to_string), head.to_string(), path.to_string()),
            patch.to_string(),
        );
        self
    }
}

impl DiffProvider for MemoryDiff {
    fn compare_revisions(
        &self,
        _repo: &RepoRef,
        base: Option<&str>,
        head: &str,
        path: &str,
    ) -> Result<String> {
        self.patches
            .get(&(base.map(str::to_string), head.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| eyre!("no diff for {path}"))
    }
}

#[derive(Default)]
pub struct MemoryOracle {
    files: HashSet<String>,
}

impl MemoryOracle {
    pub fn with(mut self, path: &str) -> Self {
        self.files.insert(path.to_string());
        self
    }
}

impl FileOracle for MemoryOracle {
    fn exists(&self, path: &str) -> bool {
        self.files.contains(path)
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub published: Mutex<Vec<(FileReportBundle, Notice)>>,
    failing: HashSet<String>,
}

impl MemorySink {
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn published_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .published
            .lock()
            .unwrap()
            .iter()
            .map(|(b, _)| b.source_path.clone())
            .collect();
        paths.sort();
        paths
    }
}

impl NoticeSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn publish(&self, bundle: &FileReportBundle, notice: &Notice) -> Result<()> {
        if self.failing.contains(&bundle.source_path) {
            return Err(eyre!("sink rejected {}", bundle.source_path));
        }
        self.published
            .lock()
            .unwrap()
            .push((bundle.clone(), notice.clone()));
        Ok(())
    }
}
