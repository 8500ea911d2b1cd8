// src/config.rs
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, fs};

pub const DEFAULT_CONFIG_PATH: &str = "config/news_core.json";
pub const ENV_CONFIG_PATH: &str = "NEWS_CORE_CONFIG";
pub const ENV_KNOWLEDGE_PATH: &str = "KNOWLEDGE_BASE_PATH";

fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_match_threshold() -> f64 {
    0.85
}
fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/knowledge_base.json")
}

/// Injected configuration for the composition root: cache TTL, scheduler
/// cadence, matcher threshold, knowledge-base file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            match_threshold: default_match_threshold(),
            knowledge_path: default_knowledge_path(),
        }
    }
}

impl AppConfig {
    /// Load from `$NEWS_CORE_CONFIG` or `config/news_core.json`, falling back
    /// to defaults on a missing or unparseable file. `KNOWLEDGE_BASE_PATH`
    /// overrides the store location either way.
    pub fn load() -> Self {
        let path = env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg: AppConfig = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(error = %e, %path, "config unreadable, using defaults");
                AppConfig::default()
            }),
            Err(_) => AppConfig::default(),
        };

        if let Ok(p) = env::var(ENV_KNOWLEDGE_PATH) {
            cfg.knowledge_path = PathBuf::from(p);
        }
        if !(0.0..=1.0).contains(&cfg.match_threshold) {
            cfg.match_threshold = default_match_threshold();
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let c = AppConfig::default();
        assert_eq!(c.cache_ttl_secs, 300);
        assert_eq!(c.refresh_interval_secs, 300);
        assert!((c.match_threshold - 0.85).abs() < 1e-9);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let c: AppConfig = serde_json::from_str(r#"{"cache_ttl_secs": 60}"#).unwrap();
        assert_eq!(c.cache_ttl_secs, 60);
        assert_eq!(c.refresh_interval_secs, 300);
    }
}
