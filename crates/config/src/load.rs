//! Layered loading: built-in defaults, then a configuration file, then
//! `TOME_`-prefixed environment variables (`TOME_CACHE__TTL_DAYS=7`).

use crate::config::{Config, project_dirs};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "TOME_";
const FILE_STEM: &str = "tome";
const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];
// Top-level sections of `Config`. Other `TOME_*` variables aren't ours.
const SECTIONS: [&str; 3] = ["cache", "catalog", "search"];

/// `SECTION__FIELD`, with a known section.
fn is_config_var(key: &str) -> bool {
    key.split_once("__").is_some_and(|(section, _)| SECTIONS.iter().any(|known| section.eq_ignore_ascii_case(known)))
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

/// Configuration files looked for when none is given explicitly.
pub fn default_files() -> Vec<PathBuf> {
    let Some(dirs) = project_dirs() else {
        return Vec::new();
    };
    FILE_EXTENSIONS.iter().map(|ext| dirs.config_dir().join(format!("{FILE_STEM}.{ext}"))).collect()
}

impl Config {
    /// Every configuration layer, unextracted.
    ///
    /// An explicit `file` replaces the default file locations. Missing
    /// default files are skipped.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => figment = merge_file(figment, path),
            None => {
                for path in default_files() {
                    figment = merge_file(figment, &path);
                }
            },
        }
        figment.merge(Env::prefixed(ENV_PREFIX).filter(|key| is_config_var(key.as_str())).split("__"))
    }

    /// Loads and validates the configuration.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file
            && !path.is_file()
        {
            exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
        }
        let config: Config = Self::figment(file).extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
