use crate::paths::PathMapper;
use staleloc_core::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Collect canonical-locale content files under `repo_root/content_dir`.
///
/// Returns sorted, `/`-separated paths relative to `repo_root`, the form
/// history providers expect. An empty `extensions` list accepts every file.
pub fn discover_source_files(
    repo_root: &Path,
    content_dir: &Path,
    mapper: &PathMapper,
    extensions: &[String],
) -> Result<Vec<String>> {
    let walk_root = repo_root.join(content_dir);
    let mut out = Vec::new();
    let walker = WalkDir::new(&walk_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let p = entry.path();
        if !extensions.is_empty() {
            let ext_ok = p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
            if !ext_ok {
                continue;
            }
        }
        let Ok(rel) = p.strip_prefix(repo_root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        if mapper.is_source_path(&rel) {
            out.push(rel);
        }
    }
    out.sort();
    out.dedup();
    tracing::debug!(event = "sources_discovered", root = %walk_root.display(), count = out.len());
    Ok(out)
}
