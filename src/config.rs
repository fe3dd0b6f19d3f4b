use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub session: SessionConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Authoritative knowledge store (JSON array).
    pub knowledge_path: String,
    /// Staging intake file (JSONL).
    pub staging_path: String,
    /// Session log file (JSONL).
    pub session_path: String,
    /// Extra source files merged into the corpus at index time.
    pub source_paths: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    pub duplicate_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub token_budget: usize,
    pub query_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for LoreConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            session: SessionConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_lore_dir();
        Self {
            knowledge_path: dir.join("knowledge.json").to_string_lossy().into_owned(),
            staging_path: dir.join("staging.jsonl").to_string_lossy().into_owned(),
            session_path: dir.join("session.jsonl").to_string_lossy().into_owned(),
            source_paths: Vec::new(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            duplicate_threshold: 0.90,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_budget: 2000,
            query_limit: 20,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "gemma3:4b".into(),
            timeout_ms: 30_000,
            probe_timeout_ms: 3_000,
        }
    }
}

/// Returns `~/.lore/`
pub fn default_lore_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".lore")
}

/// Returns the default config file path: `~/.lore/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lore_dir().join("config.toml")
}

impl LoreConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LoreConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LORE_KNOWLEDGE, LORE_GENERATION_URL,
    /// LORE_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LORE_KNOWLEDGE") {
            self.storage.knowledge_path = val;
        }
        if let Ok(val) = std::env::var("LORE_GENERATION_URL") {
            self.generation.base_url = val;
        }
        if let Ok(val) = std::env::var("LORE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the knowledge store path, expanding `~` if needed.
    pub fn resolved_knowledge_path(&self) -> PathBuf {
        expand_tilde(&self.storage.knowledge_path)
    }

    /// Resolve the staging file path, expanding `~` if needed.
    pub fn resolved_staging_path(&self) -> PathBuf {
        expand_tilde(&self.storage.staging_path)
    }

    /// Resolve the session log path, expanding `~` if needed.
    pub fn resolved_session_path(&self) -> PathBuf {
        expand_tilde(&self.storage.session_path)
    }

    /// Resolve the extra corpus source paths, expanding `~` in each.
    pub fn resolved_source_paths(&self) -> Vec<PathBuf> {
        self.storage.source_paths.iter().map(|p| expand_tilde(p)).collect()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoreConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.retrieval.default_top_k, 5);
        assert!((config.retrieval.duplicate_threshold - 0.90).abs() < 1e-9);
        assert_eq!(config.generation.base_url, "http://localhost:11434");
        assert!(config.storage.knowledge_path.ends_with("knowledge.json"));
        assert!(config.storage.session_path.ends_with("session.jsonl"));
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
knowledge_path = "/tmp/kb.json"
source_paths = ["/tmp/extra.json"]

[retrieval]
default_top_k = 10

[generation]
model = "llama3:8b"
"#;
        let config: LoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.knowledge_path, "/tmp/kb.json");
        assert_eq!(config.storage.source_paths, vec!["/tmp/extra.json"]);
        assert_eq!(config.retrieval.default_top_k, 10);
        assert_eq!(config.generation.model, "llama3:8b");
        // defaults still apply for unset fields
        assert_eq!(config.session.query_limit, 20);
        assert_eq!(config.generation.timeout_ms, 30_000);
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = LoreConfig::default();
        std::env::set_var("LORE_KNOWLEDGE", "/tmp/override.json");
        std::env::set_var("LORE_GENERATION_URL", "http://10.0.0.2:11434");
        std::env::set_var("LORE_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.knowledge_path, "/tmp/override.json");
        assert_eq!(config.generation.base_url, "http://10.0.0.2:11434");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("LORE_KNOWLEDGE");
        std::env::remove_var("LORE_GENERATION_URL");
        std::env::remove_var("LORE_LOG_LEVEL");
    }
}
