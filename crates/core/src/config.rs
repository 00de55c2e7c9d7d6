//! Project configuration (`.stake/config.toml`)
//!
//! Loaded once by the binary and passed down explicitly. A missing file means
//! defaults; a file that does not parse or validate is an error.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub stake: StakeConfig,
    pub summarizer: SummarizerConfig,
    pub watcher: WatcherConfig,
    pub telemetry: TelemetryConfig,
}

/// TTLs for the three cached value classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// VCS uncommitted-path view (default: 10s)
    pub vcs_status_ttl_secs: u64,
    /// Session state snapshot (default: 30s)
    pub session_state_ttl_secs: u64,
    /// Per-file content fingerprints (default: 300s)
    pub file_hash_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            vcs_status_ttl_secs: 10,
            session_state_ttl_secs: 30,
            file_hash_ttl_secs: 300,
        }
    }
}

/// Checkpoint behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeConfig {
    /// Scan the working tree when a stake is requested with nothing pending
    pub auto_reconcile: bool,
    /// Upper bound on the summarizer call
    pub summary_timeout_secs: u64,
    /// Marker prepended to the stake name to form the commit title
    pub title_prefix: String,
    /// List the staked files at the end of the commit description
    pub include_files: bool,
    /// Files listed before the rest collapse into "... and N more"
    pub max_files_shown: usize,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            auto_reconcile: true,
            summary_timeout_secs: 60,
            title_prefix: "Stake: ".to_string(),
            include_files: false,
            max_files_shown: 10,
        }
    }
}

/// Summarizer backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    /// Local, model-free summary
    #[default]
    Offline,
    Ollama,
    OpenAi,
    Anthropic,
}

impl SummarizerProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            SummarizerProvider::Offline => "offline",
            SummarizerProvider::Ollama => "ollama",
            SummarizerProvider::OpenAi => "openai",
            SummarizerProvider::Anthropic => "anthropic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub provider: SummarizerProvider,
    /// Model name; empty picks the provider default
    pub model: String,
    /// API base URL; empty picks the provider default
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Maximum number of changed files described in the prompt
    pub max_files: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: SummarizerProvider::Offline,
            model: String::new(),
            base_url: String::new(),
            api_key_env: None,
            max_tokens: 1024,
            temperature: 0.7,
            max_files: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Per-path debounce window
    pub debounce_ms: u64,
    /// Periodic reconciliation interval, 0 disables it
    pub reconcile_interval_secs: u64,
    /// Drop events for paths matched by .gitignore before hashing
    pub use_gitignore: bool,
    /// Extra ignore patterns (gitignore syntax)
    pub additional_patterns: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            reconcile_interval_secs: 300,
            use_gitignore: true,
            additional_patterns: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySinkKind {
    /// Append events to `.stake/telemetry.jsonl`
    #[default]
    Jsonl,
    /// Emit events as tracing records
    Tracing,
    Off,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub sink: TelemetrySinkKind,
}

impl Config {
    /// Load configuration, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        crate::layout::atomic_write(path, text.as_bytes())
    }

    /// Range-check every value
    pub fn validate(&self) -> Result<()> {
        let cache = &self.cache;
        if cache.vcs_status_ttl_secs > 3600 {
            bail!("cache.vcs_status_ttl_secs must be 0-3600");
        }
        if cache.session_state_ttl_secs > 3600 {
            bail!("cache.session_state_ttl_secs must be 0-3600");
        }
        if cache.file_hash_ttl_secs > 86_400 {
            bail!("cache.file_hash_ttl_secs must be 0-86400");
        }
        if !(1..=600).contains(&self.stake.summary_timeout_secs) {
            bail!("stake.summary_timeout_secs must be 1-600");
        }
        if !(1..=200).contains(&self.stake.max_files_shown) {
            bail!("stake.max_files_shown must be 1-200");
        }
        if !(1..=200).contains(&self.summarizer.max_files) {
            bail!("summarizer.max_files must be 1-200");
        }
        if !(0.0..=2.0).contains(&self.summarizer.temperature) {
            bail!("summarizer.temperature must be 0.0-2.0");
        }
        if self.watcher.debounce_ms > 10_000 {
            bail!("watcher.debounce_ms must be 0-10000");
        }
        let interval = self.watcher.reconcile_interval_secs;
        if interval != 0 && !(10..=86_400).contains(&interval) {
            bail!("watcher.reconcile_interval_secs must be 0 (off) or 10-86400");
        }
        Ok(())
    }

    /// Read a value by dotted key (`cache.vcs_status_ttl_secs`)
    pub fn get_key(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self).context("Failed to serialize config")?;
        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .with_context(|| format!("Unknown config key: {}", key))?;
        }
        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value by dotted key; the result is re-parsed and validated
    pub fn set_key(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self).context("Failed to serialize config")?;
        let (table_path, leaf) = match key.rsplit_once('.') {
            Some(split) => split,
            None => bail!("Unknown config key: {}", key),
        };

        let mut table = &mut root;
        for part in table_path.split('.') {
            table = table
                .get_mut(part)
                .with_context(|| format!("Unknown config key: {}", key))?;
        }
        let table = table
            .as_table_mut()
            .with_context(|| format!("Unknown config key: {}", key))?;

        // Optional keys are absent from the serialized table when unset
        let known = table.contains_key(leaf) || (table_path == "summarizer" && leaf == "api_key_env");
        if !known {
            bail!("Unknown config key: {}", key);
        }

        let value = parse_scalar(raw);
        table.insert(leaf.to_string(), value);

        let updated: Config = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Interpret a CLI-supplied value as a TOML scalar, falling back to a string
fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# .stake/config.toml

[cache]
vcs_status_ttl_secs = 10      # how long `git status` output is reused
session_state_ttl_secs = 30   # how long state.json reads are reused
file_hash_ttl_secs = 300      # per-file fingerprints (dropped on every write event)

[stake]
auto_reconcile = true         # scan the tree when staking with nothing pending
summary_timeout_secs = 60
title_prefix = "Stake: "
include_files = false         # list staked files in the commit description
max_files_shown = 10

[summarizer]
provider = "offline"          # offline | ollama | openai | anthropic
model = ""                    # empty = provider default
base_url = ""                 # empty = provider default
# api_key_env = "OPENAI_API_KEY"
max_tokens = 1024
temperature = 0.7
max_files = 10

[watcher]
debounce_ms = 300
reconcile_interval_secs = 300 # 0 disables periodic reconciliation
use_gitignore = true
additional_patterns = []

[telemetry]
sink = "jsonl"                # jsonl | tracing | off
"#
}
