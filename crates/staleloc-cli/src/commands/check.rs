use super::Context;
use crate::{OutputFormat, ProviderKind, SinkKind};
use color_eyre::eyre::{bail, eyre, Result};
use staleloc_core::{FileReportBundle, LanguageEntry, RepoRef};
use staleloc_domain::{BundleOut, FailureOut, RunReport, SummaryOut, SCHEMA_VERSION};
use staleloc_provider_api::{DiffProvider, HistoryProvider, NoticeSink};
use staleloc_services::orchestrator::DEFAULT_CONCURRENCY;
use staleloc_services::{
    discover_source_files, resolve_branch, BatchOrchestrator, DiffSummarizer,
    FileReportAggregator, FsOracle, GitHubClient, HistoryResolver, JsonDirSink,
    LocalGitProvider, NoticeStyle, OrchestratorConfig, PathMapper, RunOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_OUT_DIR: &str = "staleloc-reports";
const DEFAULT_EXTENSIONS: [&str; 2] = ["md", "mdx"];

#[derive(Debug)]
pub struct CheckArgs {
    pub root: Option<PathBuf>,
    pub files: Vec<String>,
    pub langs: Vec<String>,
    pub source_lang: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub provider: ProviderKind,
    pub git_dir: Option<PathBuf>,
    pub sink: SinkKind,
    pub out_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub format: OutputFormat,
    pub concurrency: Option<usize>,
    pub strict: bool,
}

pub fn run_check(ctx: &Context, args: CheckArgs) -> Result<()> {
    let cfg = &ctx.config;
    let repo_cfg = cfg.repo.clone().unwrap_or_default();

    let languages = if args.langs.is_empty() {
        cfg.languages.clone().unwrap_or_default()
    } else {
        args.langs.clone()
    };
    if languages.is_empty() {
        bail!("no target languages: pass --lang or set `languages` in staleloc.toml");
    }

    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let git_dir = args.git_dir.clone().unwrap_or_else(|| root.clone());
    let mapper = PathMapper::new(ctx.source_lang(args.source_lang.clone()));

    let needs_github = args.provider == ProviderKind::Github || args.sink == SinkKind::Github;
    let owner = args.owner.clone().or(repo_cfg.owner.clone());
    let name = args.repo.clone().or(repo_cfg.name.clone());
    let mut repo = match (owner, name) {
        (Some(owner), Some(name)) => RepoRef::new(owner, name),
        _ if !needs_github => RepoRef::new("local", checkout_name(&git_dir)),
        _ => bail!("repository owner and name are required: pass --owner/--repo or set [repo] in staleloc.toml"),
    };
    if let Some(b) = &repo_cfg.default_branch {
        repo = repo.with_default_branch(b.clone());
    }
    if let Some(w) = &repo_cfg.web_base {
        repo = repo.with_web_base(w.clone());
    }

    let client = if needs_github {
        let token = repo_cfg
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        if token.is_none() {
            tracing::warn!(event = "github_token_missing", "no GitHub token; requests are unauthenticated");
        }
        Some(GitHubClient::new(repo_cfg.api_base.as_deref(), token)?)
    } else {
        None
    };

    let (history, diffs): (Arc<dyn HistoryProvider>, Arc<dyn DiffProvider>) = match args.provider
    {
        ProviderKind::Git => {
            let git = Arc::new(LocalGitProvider::new(&git_dir));
            (git.clone(), git)
        }
        ProviderKind::Github => {
            let gh = Arc::new(
                client
                    .clone()
                    .ok_or_else(|| eyre!("GitHub client not configured"))?,
            );
            (gh.clone(), gh)
        }
    };

    let out_dir = args
        .out_dir
        .clone()
        .or_else(|| {
            cfg.output
                .as_ref()
                .and_then(|o| o.out_dir.as_ref())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let sink: Arc<dyn NoticeSink> = match (args.sink, client) {
        (SinkKind::Github, Some(client)) => Arc::new(client.with_issue_repo(repo.clone())),
        (SinkKind::Github, None) => bail!("GitHub sink requested without a GitHub client"),
        (SinkKind::Json, _) => Arc::new(JsonDirSink::new(out_dir)),
    };

    let branch = match args.branch.clone().or(repo_cfg.branch.clone()) {
        Some(b) => b,
        None => resolve_branch(&git_dir, &repo.default_branch),
    };

    let files = if args.files.is_empty() {
        let content_dir = cfg.content_root.clone().unwrap_or_default();
        let extensions: Vec<String> = cfg
            .extensions
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect());
        discover_source_files(&root, Path::new(&content_dir), &mapper, &extensions)?
    } else {
        args.files.iter().map(|f| normalize_input(f)).collect()
    };

    let mut style = NoticeStyle::default();
    if let Some(n) = &cfg.notice {
        if let Some(label) = &n.label {
            style.label = label.clone();
        }
        if let Some(prefix) = &n.title_prefix {
            style.title_prefix = prefix.clone();
        }
    }

    let mut config = OrchestratorConfig::new(languages, branch.clone());
    config.dry_run = args.dry_run;
    config.concurrency = args
        .concurrency
        .or(cfg.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    config.notice = style;

    let resolver = HistoryResolver::new(history, repo);
    let aggregator = FileReportAggregator::new(
        mapper,
        resolver.clone(),
        Arc::new(FsOracle::new(&root)),
        DiffSummarizer::new(resolver, diffs),
    );
    let orchestrator = BatchOrchestrator::new(aggregator, sink, config)?;
    let outcome = orchestrator.run(&files);

    match args.format {
        OutputFormat::Json => {
            let report = to_report(&outcome, &branch, args.dry_run);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_text(ctx.use_color, &outcome, &branch, args.dry_run),
    }

    let s = &outcome.summary;
    if args.strict && (s.counts.outdated + s.counts.missing > 0 || !s.failures.is_empty()) {
        bail!(
            "{} outdated, {} missing, {} failed file operation(s)",
            s.counts.outdated,
            s.counts.missing,
            s.failures.len()
        );
    }
    Ok(())
}

fn normalize_input(raw: &str) -> String {
    let p = raw.replace('\\', "/");
    p.strip_prefix("./").map(str::to_string).unwrap_or(p)
}

fn checkout_name(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "repo".to_string())
}

fn to_report(outcome: &RunOutcome, branch: &str, dry_run: bool) -> RunReport {
    let s = &outcome.summary;
    RunReport {
        schema_version: SCHEMA_VERSION,
        branch: branch.to_string(),
        dry_run,
        summary: SummaryOut {
            files_checked: s.files_checked,
            bundles: s.bundles,
            published: s.published,
            outdated: s.counts.outdated,
            missing: s.counts.missing,
            current: s.counts.current,
            skipped: s.counts.skipped,
        },
        bundles: outcome.bundles.iter().map(BundleOut::from).collect(),
        failures: s
            .failures
            .iter()
            .map(|f| FailureOut {
                path: f.path.clone(),
                kind: f.kind.clone(),
                message: f.message.clone(),
            })
            .collect(),
    }
}

fn languages(entries: &[LanguageEntry]) -> String {
    entries
        .iter()
        .map(|e| e.language.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_bundle(use_color: bool, b: &FileReportBundle) {
    use owo_colors::OwoColorize;
    let mut parts = Vec::new();
    if !b.outdated.is_empty() {
        let list = languages(&b.outdated);
        parts.push(if use_color {
            format!("outdated: {}", list.yellow())
        } else {
            format!("outdated: {list}")
        });
    }
    if !b.missing.is_empty() {
        let list = languages(&b.missing);
        parts.push(if use_color {
            format!("missing: {}", list.red())
        } else {
            format!("missing: {list}")
        });
    }
    if use_color {
        println!("✎ {}  {}", b.source_path.green(), parts.join("  "));
    } else {
        println!("✎ {}  {}", b.source_path, parts.join("  "));
    }
    if let Some(d) = &b.diff {
        let note = if d.is_truncated { " (diff truncated)" } else { "" };
        if use_color {
            println!("    {}{}", d.compare_url.blue(), note);
        } else {
            println!("    {}{}", d.compare_url, note);
        }
    }
}

fn print_text(use_color: bool, outcome: &RunOutcome, branch: &str, dry_run: bool) {
    use owo_colors::OwoColorize;
    let s = &outcome.summary;
    for b in &outcome.bundles {
        print_bundle(use_color, b);
    }
    for f in &s.failures {
        if use_color {
            println!("✖ [{}] {} — {}", f.kind.red(), f.path.blue(), f.message);
        } else {
            println!("✖ [{}] {} — {}", f.kind, f.path, f.message);
        }
    }
    if outcome.bundles.is_empty() && s.failures.is_empty() {
        println!("✔ All translations up to date ({} file(s) on {branch})", s.files_checked);
    }
    let published = if dry_run {
        "dry run, nothing published".to_string()
    } else {
        format!("{} published", s.published)
    };
    println!(
        "Summary: {} file(s), {} notice(s) ({published}); outdated {}, missing {}, current {}, skipped {}; failures {}",
        s.files_checked,
        s.bundles,
        s.counts.outdated,
        s.counts.missing,
        s.counts.current,
        s.counts.skipped,
        s.failures.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_are_normalized() {
        assert_eq!(normalize_input(".\\content\\en\\a.md"), "content/en/a.md");
        assert_eq!(normalize_input("./en/a.md"), "en/a.md");
        assert_eq!(normalize_input("en/a.md"), "en/a.md");
    }

    #[test]
    fn report_carries_summary_counts() {
        let mut outcome = RunOutcome::default();
        outcome.summary.files_checked = 3;
        outcome.summary.counts.missing = 2;
        outcome.summary.failures.push(staleloc_services::FileFailure {
            path: "x.md".into(),
            kind: "path".into(),
            message: "not a source path".into(),
        });
        let r = to_report(&outcome, "main", true);
        assert_eq!(r.schema_version, SCHEMA_VERSION);
        assert_eq!(r.summary.files_checked, 3);
        assert_eq!(r.summary.missing, 2);
        assert_eq!(r.failures[0].kind, "path");
        assert!(r.dry_run);
    }
}
