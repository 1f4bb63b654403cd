use std::path::Path;

/// Pick the branch used for first-attempt history lookups.
///
/// Order: pull-request head ref (`GITHUB_HEAD_REF`), push ref
/// (`GITHUB_REF`, branch refs only), the checked-out branch of the local
/// repository around `workdir`, then `default_branch`.
pub fn resolve_branch(workdir: &Path, default_branch: &str) -> String {
    resolve_branch_with(
        |key| std::env::var(key).ok(),
        || local_branch(workdir),
        default_branch,
    )
}

/// Same policy with injectable environment and local VCS lookups.
pub fn resolve_branch_with<E, L>(env: E, local: L, default_branch: &str) -> String
where
    E: Fn(&str) -> Option<String>,
    L: FnOnce() -> Option<String>,
{
    if let Some(head) = env("GITHUB_HEAD_REF").filter(|s| !s.trim().is_empty()) {
        tracing::debug!(event = "branch_resolved", source = "pr_head_ref", branch = %head);
        return head.trim().to_string();
    }
    if let Some(branch) = env("GITHUB_REF")
        .as_deref()
        .and_then(|r| r.trim().strip_prefix("refs/heads/"))
        .filter(|s| !s.is_empty())
    {
        tracing::debug!(event = "branch_resolved", source = "push_ref", branch = %branch);
        return branch.to_string();
    }
    if let Some(branch) = local().filter(|s| !s.is_empty()) {
        tracing::debug!(event = "branch_resolved", source = "local_vcs", branch = %branch);
        return branch;
    }
    tracing::debug!(event = "branch_resolved", source = "default", branch = %default_branch);
    default_branch.to_string()
}

/// Current branch name of the repository containing `workdir`, `None` when
/// there is no repository or HEAD is detached.
pub fn local_branch(workdir: &Path) -> Option<String> {
    let repo = git2::Repository::discover(workdir).ok()?;
    if repo.head_detached().unwrap_or(true) {
        return None;
    }
    let head = repo.head().ok()?;
    head.shorthand().map(str::to_string)
}
