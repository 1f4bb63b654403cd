use staleloc_core::{FileReportBundle, LanguageStatus, Notice};
use std::fmt::Write;

/// Wording knobs of the rendered notice.
#[derive(Debug, Clone)]
pub struct NoticeStyle {
    /// Fixed marker label attached to every notice.
    pub label: String,
    pub title_prefix: String,
    /// Prefix of the per-language labels, e.g. `lang:` -> `lang:hi`.
    pub language_label_prefix: String,
}

impl Default for NoticeStyle {
    fn default() -> Self {
        Self {
            label: "needs translation".to_string(),
            title_prefix: "Translation update needed".to_string(),
            language_label_prefix: "lang:".to_string(),
        }
    }
}

/// Thin Markdown rendering of a bundle: title, body and label set.
pub fn render_notice(bundle: &FileReportBundle, style: &NoticeStyle) -> Notice {
    let title = format!("{}: {}", style.title_prefix, bundle.source_path);

    let mut labels = vec![style.label.clone()];
    for lang in bundle.affected_languages() {
        let label = format!("{}{}", style.language_label_prefix, lang);
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    let mut body = String::new();
    let _ = writeln!(body, "Source file: `{}`", bundle.source_path);
    if let Some(rev) = &bundle.source_revision {
        let _ = writeln!(
            body,
            "Latest source change: [{}]({}) by {} on {} ({})",
            rev.short_id(),
            rev.view_url,
            rev.author_name,
            rev.timestamp.format("%Y-%m-%d"),
            first_line(&rev.summary_text)
        );
    }

    if !bundle.outdated.is_empty() {
        let _ = writeln!(body, "\n### Outdated translations\n");
        let _ = writeln!(body, "| Language | Translation updated | Source updated |");
        let _ = writeln!(body, "|---|---|---|");
        for entry in &bundle.outdated {
            if let LanguageStatus::Outdated {
                source_revision,
                translation_revision,
            } = &entry.status
            {
                let _ = writeln!(
                    body,
                    "| `{}` | {} ([{}]({})) | {} ([{}]({})) |",
                    entry.language,
                    translation_revision.timestamp.format("%Y-%m-%d"),
                    translation_revision.short_id(),
                    translation_revision.view_url,
                    source_revision.timestamp.format("%Y-%m-%d"),
                    source_revision.short_id(),
                    source_revision.view_url,
                );
            }
        }
    }

    if !bundle.missing.is_empty() {
        let _ = writeln!(body, "\n### Missing translations\n");
        for entry in &bundle.missing {
            if let LanguageStatus::Missing { expected_path } = &entry.status {
                let _ = writeln!(body, "- `{}`: expected at `{}`", entry.language, expected_path);
            }
        }
    }

    if !bundle.current.is_empty() {
        let current: Vec<String> = bundle
            .current
            .iter()
            .map(|e| format!("`{}`", e.language))
            .collect();
        let _ = writeln!(body, "\nUp to date: {}", current.join(", "));
    }

    if let Some(diff) = &bundle.diff {
        let _ = writeln!(body, "\n### Source changes\n");
        let _ = writeln!(body, "[View changes]({})", diff.compare_url);
        if let Some(snippet) = &diff.text_snippet {
            let _ = writeln!(body, "\n```diff\n{}\n```", snippet);
            if diff.is_truncated {
                let _ = writeln!(body, "\n_Diff truncated; follow the link above for the full change._");
            }
        }
    }

    Notice {
        title,
        body,
        labels,
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}
