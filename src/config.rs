//! Configuration module for the knowledge-base assistant.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SKB_` and use double underscores
//! to separate nested levels:
//! - `SKB_SEARCH__FAQ_THRESHOLD=0.4` sets `search.faq_threshold`
//! - `SKB_STREAMING__ANSWER_INTERVAL_MS=0` sets `streaming.answer_interval_ms`
//! - `SKB_KNOWLEDGE__VARIANT=faq` sets `knowledge.variant`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::knowledge::{Thresholds, Variant};
use crate::stream::EmitterOptions;

/// Directory holding the settings file, looked up from the current directory upwards.
pub const CONFIG_DIR: &str = ".streamkb";
pub const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SKB_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug logging
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KnowledgeConfig {
    /// Which kind of knowledge base to serve
    #[serde(default)]
    pub variant: Variant,

    /// Dataset file; the built-in corpus is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,

    /// Maximum number of valid entries kept from a dataset file
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub faq_threshold: f32,

    #[serde(default = "default_threshold")]
    pub article_threshold: f32,

    #[serde(default = "default_threshold")]
    pub instruction_threshold: f32,

    /// Instruction threshold used for queries shorter than `short_query_words`
    #[serde(default = "default_short_query_threshold")]
    pub instruction_short_query_threshold: f32,

    #[serde(default = "default_short_query_words")]
    pub short_query_words: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StreamingConfig {
    /// Base delay per answer character
    #[serde(default = "default_answer_interval_ms")]
    pub answer_interval_ms: u64,

    /// Base delay per thinking character
    #[serde(default = "default_thinking_interval_ms")]
    pub thinking_interval_ms: u64,

    /// Fixed pause after each thinking step
    #[serde(default = "default_step_pause_ms")]
    pub step_pause_ms: u64,

    /// Upper bound of the random extra pause after each thinking step
    #[serde(default = "default_step_pause_jitter_ms")]
    pub step_pause_jitter_ms: u64,

    /// Randomize character delays and step pauses
    #[serde(default = "default_true")]
    pub jitter: bool,

    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_max_entries() -> usize {
    50_000
}
fn default_threshold() -> f32 {
    0.3
}
fn default_short_query_threshold() -> f32 {
    0.2
}
fn default_short_query_words() -> usize {
    5
}
fn default_answer_interval_ms() -> u64 {
    20
}
fn default_thinking_interval_ms() -> u64 {
    3
}
fn default_step_pause_ms() -> u64 {
    200
}
fn default_step_pause_jitter_ms() -> u64 {
    300
}
fn default_stop_timeout_ms() -> u64 {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: default_false(),
            knowledge: KnowledgeConfig::default(),
            search: SearchConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            dataset: None,
            max_entries: default_max_entries(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            faq_threshold: default_threshold(),
            article_threshold: default_threshold(),
            instruction_threshold: default_threshold(),
            instruction_short_query_threshold: default_short_query_threshold(),
            short_query_words: default_short_query_words(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            answer_interval_ms: default_answer_interval_ms(),
            thinking_interval_ms: default_thinking_interval_ms(),
            step_pause_ms: default_step_pause_ms(),
            step_pause_jitter_ms: default_step_pause_jitter_ms(),
            jitter: default_true(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl SearchConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            faq: self.faq_threshold,
            article: self.article_threshold,
            instruction: self.instruction_threshold,
            instruction_short_query: self.instruction_short_query_threshold,
            short_query_words: self.short_query_words,
        }
    }
}

impl StreamingConfig {
    pub fn answer_emitter(&self) -> EmitterOptions {
        EmitterOptions {
            interval: Duration::from_millis(self.answer_interval_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }

    pub fn thinking_emitter(&self) -> EmitterOptions {
        EmitterOptions {
            interval: Duration::from_millis(self.thinking_interval_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }
}

/// Environment overrides: `SKB_A__B` sets `a.b`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still layering defaults and environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for the config directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> KnowledgeResult<()> {
        let thresholds = [
            ("search.faq_threshold", self.search.faq_threshold),
            ("search.article_threshold", self.search.article_threshold),
            ("search.instruction_threshold", self.search.instruction_threshold),
            (
                "search.instruction_short_query_threshold",
                self.search.instruction_short_query_threshold,
            ),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(KnowledgeError::Config {
                    reason: format!("{key} must be between 0.0 and 1.0, got {value}"),
                });
            }
        }
        if self.knowledge.max_entries == 0 {
            return Err(KnowledgeError::Config {
                reason: "knowledge.max_entries must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective settings as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        std::fs::write(path, self.to_toml()?)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments under `root`
    pub fn init_config_file(
        root: impl AsRef<Path>,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, SETTINGS_TEMPLATE)?;

        Ok(config_path)
    }
}

const SETTINGS_TEMPLATE: &str = r#"# streamkb configuration file

# Version of the configuration schema
version = 1

# Global debug logging (written to stderr)
debug = false

[knowledge]
# Knowledge base kind: "faq", "article" or "instruction"
variant = "article"

# JSON dataset file. The faq and article variants fall back to a built-in
# corpus when this is unset; the instruction variant requires it.
# dataset = "data/alpaca.json"

# Maximum number of valid entries kept from the dataset
max_entries = 50000

[search]
# Minimum cosine similarity for a confident answer (0.0 to 1.0).
# A top score equal to the threshold counts as confident.
faq_threshold = 0.3
article_threshold = 0.3
instruction_threshold = 0.3

# Instruction queries with fewer words than short_query_words use this threshold
instruction_short_query_threshold = 0.2
short_query_words = 5

[streaming]
# Base delay per character in milliseconds (0 prints instantly)
answer_interval_ms = 20
thinking_interval_ms = 3

# Pause after each thinking step: step_pause_ms plus up to step_pause_jitter_ms
step_pause_ms = 200
step_pause_jitter_ms = 300

# Randomize delays; when false every character waits exactly the interval
jitter = true

# How long to wait for an output worker to finish when closing
stop_timeout_ms = 1000
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.knowledge.variant, Variant::Article);
        assert_eq!(settings.knowledge.max_entries, 50_000);
        assert_eq!(settings.search.thresholds(), Thresholds::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[knowledge]
variant = "instruction"
dataset = "alpaca.json"

[search]
instruction_threshold = 0.35
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.knowledge.variant, Variant::Instruction);
        assert_eq!(settings.knowledge.dataset, Some(PathBuf::from("alpaca.json")));
        assert_eq!(settings.search.instruction_threshold, 0.35);
        // Untouched keys keep their defaults
        assert_eq!(settings.search.instruction_short_query_threshold, 0.2);
        assert_eq!(settings.streaming.answer_interval_ms, 20);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[streaming]\nstop_timeout_ms = 500\n").unwrap();

        unsafe {
            std::env::set_var("SKB_STREAMING__STOP_TIMEOUT_MS", "250");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("SKB_STREAMING__STOP_TIMEOUT_MS");
        }

        assert_eq!(settings.streaming.stop_timeout_ms, 250);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.knowledge.variant = Variant::Faq;
        settings.search.faq_threshold = 0.45;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.knowledge.variant, Variant::Faq);
        assert_eq!(loaded.search.faq_threshold, 0.45);
    }

    #[test]
    fn test_init_template_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.ends_with(".streamkb/settings.toml"));

        let parsed: Settings = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.search, SearchConfig::default());
        assert_eq!(parsed.knowledge, KnowledgeConfig::default());

        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = Settings::default();
        settings.search.article_threshold = 1.5;
        let err = settings.validate().unwrap_err();
        assert_eq!(err.status_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("search.article_threshold"));
    }
}
