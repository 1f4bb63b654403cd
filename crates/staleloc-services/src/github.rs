//! GitHub REST transport for history, diffs and issue publishing.

use chrono::{DateTime, Utc};
use color_eyre::eyre::{bail, eyre};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use staleloc_core::{FileReportBundle, Notice, RepoRef, Result, RevisionRecord};
use staleloc_provider_api::{DiffProvider, HistoryProvider, NoticeSink};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "staleloc/cli";

/// Blocking GitHub API client. One instance serves the whole run; the
/// underlying connection pool is shared across worker threads.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
    /// Repository issues are opened in when used as a sink.
    issue_repo: Option<RepoRef>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
    html_url: String,
    commit: CommitDetail,
    #[serde(default)]
    parents: Vec<ParentRef>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<GitActor>,
    committer: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    name: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ParentRef {
    sha: String,
}

#[derive(Debug, Default, Deserialize)]
struct FilesResponse {
    #[serde(default)]
    files: Vec<ChangedFile>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    filename: String,
    patch: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

impl GitHubClient {
    pub fn new(api_base: Option<&str>, token: Option<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            issue_repo: None,
        })
    }

    /// Target repository for [`NoticeSink::publish`].
    pub fn with_issue_repo(mut self, repo: RepoRef) -> Self {
        self.issue_repo = Some(repo);
        self
    }

    fn repo_url(&self, repo: &RepoRef, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, repo.owner, repo.name, tail)
    }

    fn authorized(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        let req = req.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.authorized(self.http.get(url).query(query)).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("GET {url} returned {status}: {}", excerpt(&body));
        }
        Ok(resp.json()?)
    }
}

fn excerpt(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

fn to_record(item: CommitItem) -> Result<RevisionRecord> {
    let actor = item
        .commit
        .committer
        .as_ref()
        .or(item.commit.author.as_ref())
        .ok_or_else(|| eyre!("commit {} has no author or committer", item.sha))?;
    let author_name = item
        .commit
        .author
        .as_ref()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| actor.name.clone());
    Ok(RevisionRecord::new(
        item.sha,
        actor.date,
        author_name,
        item.commit.message,
        item.html_url,
    ))
}

impl HistoryProvider for GitHubClient {
    fn list_revisions(
        &self,
        repo: &RepoRef,
        branch: &str,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RevisionRecord>> {
        let per_page = limit.clamp(1, 100).to_string();
        let items: Vec<CommitItem> = self.get_json(
            &self.repo_url(repo, "commits"),
            &[("sha", branch), ("path", path), ("per_page", per_page.as_str())],
        )?;
        items.into_iter().take(limit).map(to_record).collect()
    }

    fn parent_revision(&self, repo: &RepoRef, revision_id: &str) -> Result<Option<String>> {
        let item: CommitItem =
            self.get_json(&self.repo_url(repo, &format!("commits/{revision_id}")), &[])?;
        Ok(item.parents.into_iter().next().map(|p| p.sha))
    }
}

impl DiffProvider for GitHubClient {
    fn compare_revisions(
        &self,
        repo: &RepoRef,
        base: Option<&str>,
        head: &str,
        path: &str,
    ) -> Result<String> {
        let tail = match base {
            Some(base) => format!("compare/{base}...{head}"),
            None => format!("commits/{head}"),
        };
        let resp: FilesResponse = self.get_json(&self.repo_url(repo, &tail), &[])?;
        Ok(patch_for(resp, path))
    }
}

fn patch_for(resp: FilesResponse, path: &str) -> String {
    resp.files
        .into_iter()
        .find(|f| f.filename == path)
        .and_then(|f| f.patch)
        .unwrap_or_default()
}

impl NoticeSink for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    fn publish(&self, bundle: &FileReportBundle, notice: &Notice) -> Result<()> {
        let repo = self
            .issue_repo
            .as_ref()
            .ok_or_else(|| eyre!("no repository configured for issues"))?;
        let payload = NewIssue {
            title: &notice.title,
            body: &notice.body,
            labels: &notice.labels,
        };
        let url = self.repo_url(repo, "issues");
        let resp = self.authorized(self.http.post(&url).json(&payload)).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!(
                "opening issue for {} returned {status}: {}",
                bundle.source_path,
                excerpt(&body)
            );
        }
        Ok(())
    }
}
