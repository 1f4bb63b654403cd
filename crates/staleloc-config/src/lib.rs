use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "staleloc.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StalelocConfig {
    pub source_lang: Option<String>,
    pub languages: Option<Vec<String>>,
    pub content_root: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub repo: Option<RepoCfg>,
    pub notice: Option<NoticeCfg>,
    pub output: Option<OutputCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoCfg {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub default_branch: Option<String>,
    pub web_base: Option<String>,
    pub api_base: Option<String>,
    /// Explicit branch, bypasses environment detection.
    pub branch: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeCfg {
    pub label: Option<String>,
    pub title_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Load and merge configuration. Search order: CWD/staleloc.toml, then
/// $CONFIG_DIR/staleloc/staleloc.toml. Earlier files win per field; unreadable
/// or malformed files are skipped.
pub fn load_config() -> Result<StalelocConfig, ConfigError> {
    let mut merged = StalelocConfig::default();
    if let Ok(p) = std::env::current_dir() {
        if let Ok(cfg) = load_config_from(&p.join(CONFIG_FILE_NAME)) {
            merged = merge(merged, cfg);
        }
    }
    if let Some(base) = dirs::config_dir() {
        if let Ok(cfg) = load_config_from(&base.join("staleloc").join(CONFIG_FILE_NAME)) {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

/// Load a single explicit file, reporting read and parse errors.
pub fn load_config_from(path: &Path) -> Result<StalelocConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<StalelocConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn merge(mut a: StalelocConfig, b: StalelocConfig) -> StalelocConfig {
    if a.source_lang.is_none() {
        a.source_lang = b.source_lang;
    }
    if a.languages.is_none() {
        a.languages = b.languages;
    }
    if a.content_root.is_none() {
        a.content_root = b.content_root;
    }
    if a.extensions.is_none() {
        a.extensions = b.extensions;
    }
    if a.concurrency.is_none() {
        a.concurrency = b.concurrency;
    }
    a.repo = merge_opt(a.repo, b.repo, merge_repo);
    a.notice = merge_opt(a.notice, b.notice, merge_notice);
    a.output = merge_opt(a.output, b.output, merge_output);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_repo(mut a: RepoCfg, b: RepoCfg) -> RepoCfg {
    if a.owner.is_none() {
        a.owner = b.owner;
    }
    if a.name.is_none() {
        a.name = b.name;
    }
    if a.default_branch.is_none() {
        a.default_branch = b.default_branch;
    }
    if a.web_base.is_none() {
        a.web_base = b.web_base;
    }
    if a.api_base.is_none() {
        a.api_base = b.api_base;
    }
    if a.branch.is_none() {
        a.branch = b.branch;
    }
    if a.token.is_none() {
        a.token = b.token;
    }
    a
}

fn merge_notice(mut a: NoticeCfg, b: NoticeCfg) -> NoticeCfg {
    if a.label.is_none() {
        a.label = b.label;
    }
    if a.title_prefix.is_none() {
        a.title_prefix = b.title_prefix;
    }
    a
}

fn merge_output(mut a: OutputCfg, b: OutputCfg) -> OutputCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}
