pub mod check;
pub mod map;
pub mod schema;

use color_eyre::eyre::Result;
use staleloc_config::StalelocConfig;
use std::path::Path;

pub const DEFAULT_SOURCE_LANG: &str = "en";

/// Settings shared by every subcommand.
pub struct Context {
    pub use_color: bool,
    pub config: StalelocConfig,
}

impl Context {
    pub fn load(use_color: bool, explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => staleloc_config::load_config_from(path)?,
            None => staleloc_config::load_config().unwrap_or_default(),
        };
        Ok(Self { use_color, config })
    }

    pub fn source_lang(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.config.source_lang.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string())
    }
}
