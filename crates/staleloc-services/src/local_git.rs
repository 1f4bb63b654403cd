//! History and diffs read from a local clone through libgit2.
//!
//! `git2::Repository` is not `Sync`, so every call opens its own handle;
//! the provider itself only stores the path and is freely shareable.

use chrono::{TimeZone, Utc};
use color_eyre::eyre::eyre;
use git2::{DiffFormat, DiffOptions, Oid, Repository, Sort, Tree};
use staleloc_core::{RepoRef, Result, RevisionRecord};
use staleloc_provider_api::{DiffProvider, HistoryProvider};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalGitProvider {
    git_dir: PathBuf,
}

impl LocalGitProvider {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    fn open(&self) -> Result<Repository> {
        Ok(Repository::discover(&self.git_dir)?)
    }
}

/// Resolve a branch name to its tip: local branch, then `origin/<branch>`,
/// then any revspec git understands.
fn branch_tip(repo: &Repository, branch: &str) -> Result<Oid> {
    for candidate in [
        format!("refs/heads/{branch}"),
        format!("refs/remotes/origin/{branch}"),
    ] {
        if let Ok(r) = repo.find_reference(&candidate) {
            if let Ok(commit) = r.peel_to_commit() {
                return Ok(commit.id());
            }
        }
    }
    let obj = repo
        .revparse_single(branch)
        .map_err(|e| eyre!("unknown branch `{branch}`: {e}"))?;
    Ok(obj.peel_to_commit()?.id())
}

fn entry_id(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|e| e.id())
}

impl HistoryProvider for LocalGitProvider {
    fn list_revisions(
        &self,
        repo_ref: &RepoRef,
        branch: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RevisionRecord>> {
        let repo = self.open()?;
        let tip = branch_tip(&repo, branch)?;
        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        walk.push(tip)?;

        let file = Path::new(path);
        let mut out = Vec::new();
        for oid in walk {
            if out.len() >= limit {
                break;
            }
            let commit = repo.find_commit(oid?)?;
            let here = entry_id(&commit.tree()?, file);
            // touched when the blob differs from every parent
            let touched = if commit.parent_count() == 0 {
                here.is_some()
            } else {
                let mut differs_from_all = true;
                for parent in commit.parents() {
                    if entry_id(&parent.tree()?, file) == here {
                        differs_from_all = false;
                        break;
                    }
                }
                differs_from_all
            };
            if !touched {
                continue;
            }
            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .ok_or_else(|| eyre!("commit {} has an invalid timestamp", commit.id()))?;
            let sha = commit.id().to_string();
            out.push(RevisionRecord::new(
                sha.clone(),
                timestamp,
                commit.author().name().unwrap_or("unknown"),
                commit.message().unwrap_or("").trim_end(),
                repo_ref.commit_url(&sha),
            ));
        }
        Ok(out)
    }

    fn parent_revision(&self, _repo_ref: &RepoRef, revision_id: &str) -> Result<Option<String>> {
        let repo = self.open()?;
        let commit = repo.find_commit(Oid::from_str(revision_id)?)?;
        Ok(commit.parent_id(0).ok().map(|id| id.to_string()))
    }
}

impl DiffProvider for LocalGitProvider {
    fn compare_revisions(
        &self,
        _repo_ref: &RepoRef,
        base: Option<&str>,
        head: &str,
        path: &str,
    ) -> Result<String> {
        let repo = self.open()?;
        let head_tree = repo.find_commit(Oid::from_str(head)?)?.tree()?;
        let base_tree = match base {
            Some(b) => Some(repo.find_commit(Oid::from_str(b)?)?.tree()?),
            None => None,
        };
        let mut opts = DiffOptions::new();
        opts.pathspec(path);
        let diff = repo.diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), Some(&mut opts))?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            if matches!(origin, '+' | '-' | ' ') {
                text.push(origin);
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }
}
