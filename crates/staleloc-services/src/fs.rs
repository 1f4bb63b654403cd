use serde::Serialize;
use staleloc_core::{FileReportBundle, Notice, Result};
use staleloc_provider_api::{FileOracle, NoticeSink};
use std::path::{Path, PathBuf};

/// Existence checks against a checked-out content tree.
#[derive(Debug, Clone)]
pub struct FsOracle {
    root: PathBuf,
}

impl FsOracle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileOracle for FsOracle {
    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }
}

/// Writes each notice as `<out_dir>/<flattened source path>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    out_dir: PathBuf,
}

#[derive(Serialize)]
struct NoticeFile<'a> {
    notice: &'a Notice,
    bundle: &'a FileReportBundle,
}

impl JsonDirSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn file_for(&self, source_path: &str) -> PathBuf {
        let mut name = String::with_capacity(source_path.len() + 8);
        for c in source_path.chars() {
            match c {
                '/' | '\\' => name.push_str("__"),
                c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => name.push(c),
                _ => name.push('_'),
            }
        }
        self.out_dir.join(format!("{name}.json"))
    }
}

impl NoticeSink for JsonDirSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn publish(&self, bundle: &FileReportBundle, notice: &Notice) -> Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.file_for(&bundle.source_path);
        let f = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(f, &NoticeFile { notice, bundle })?;
        tracing::debug!(event = "notice_written", path = %path.display());
        Ok(())
    }
}
