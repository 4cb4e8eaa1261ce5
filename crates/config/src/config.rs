use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tome_catalog::{DEFAULT_BASE_URL, DEFAULT_COVERS_URL, DEFAULT_LIMIT, DEFAULT_USER_AGENT};

pub const DEFAULT_TTL_DAYS: u32 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
const CACHE_FILE: &str = "cache.sqlite";

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tome")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cache: CacheConfig,
    pub catalog: CatalogConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub path: PathBuf,
    /// Days a cached book stays fresh.
    pub ttl_days: u32,
}
impl Default for CacheConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.cache_dir().join(CACHE_FILE),
            // No home directory; fall back to the working directory.
            None => PathBuf::from(CACHE_FILE),
        };
        Self { path, ttl_days: DEFAULT_TTL_DAYS }
    }
}
impl CacheConfig {
    pub fn ttl(&self) -> time::Duration {
        time::Duration::days(i64::from(self.ttl_days))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub base_url: String,
    pub covers_url: String,
    pub user_agent: String,
    /// Results per search.
    pub limit: u32,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    /// Show summaries, study guides and the like alongside original works.
    pub show_derivative: bool,
}
impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: DEFAULT_DEBOUNCE_MS, show_derivative: false }
    }
}
impl SearchConfig {
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

fn invalid(field: &'static str, reason: &'static str) -> Result<()> {
    exn::bail!(ErrorKind::Invalid { field, reason })
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.cache.path.as_os_str().is_empty() {
            return invalid("cache.path", "must not be empty");
        }
        if self.cache.ttl_days == 0 {
            return invalid("cache.ttl_days", "must be > 0");
        }
        if self.catalog.base_url.trim().is_empty() {
            return invalid("catalog.base_url", "must not be empty");
        }
        if self.catalog.covers_url.trim().is_empty() {
            return invalid("catalog.covers_url", "must not be empty");
        }
        if self.catalog.user_agent.trim().is_empty() {
            return invalid("catalog.user_agent", "must not be empty");
        }
        if self.catalog.limit == 0 {
            return invalid("catalog.limit", "must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.cache.ttl(), time::Duration::days(30));
        assert_eq!(config.catalog.limit, 20);
        assert_eq!(config.search.debounce(), std::time::Duration::from_millis(500));
        assert!(!config.search.show_derivative);
        assert!(config.cache.path.ends_with(CACHE_FILE));
    }

    #[rstest]
    #[case::ttl(|c: &mut Config| c.cache.ttl_days = 0, "cache.ttl_days")]
    #[case::limit(|c: &mut Config| c.catalog.limit = 0, "catalog.limit")]
    #[case::base_url(|c: &mut Config| c.catalog.base_url = " ".into(), "catalog.base_url")]
    #[case::covers_url(|c: &mut Config| c.catalog.covers_url = String::new(), "catalog.covers_url")]
    #[case::path(|c: &mut Config| c.cache.path = PathBuf::new(), "cache.path")]
    fn test_validation(#[case] break_it: fn(&mut Config), #[case] expected: &str) {
        let mut config = Config::default();
        break_it(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field, .. } if *field == expected));
    }
}
