use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub chat: ChatConfig,
    pub data: DataConfig,
}

/// Generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint of the script generation service.
    pub endpoint: String,
    /// Timeout for refinement question calls, in seconds.
    pub question_timeout_secs: u64,
    /// Timeout for full generation / regeneration calls, in seconds.
    pub generation_timeout_secs: u64,
    /// Retry budget for refinement question calls.
    pub question_retries: u32,
    /// Retry budget for generation calls.
    pub generation_retries: u32,
}

/// Refinement chat pacing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Per-character delay of the typing reveal, in milliseconds.
    pub typing_interval_ms: u64,
    /// Pause between a user answer and the next question fetch, in milliseconds.
    pub answer_delay_ms: u64,
    /// Pause after the closing acknowledgement before refinement completes,
    /// in milliseconds.
    pub completion_pause_ms: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            chat: ChatConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.scriptforge.dev/generate".to_string(),
            question_timeout_secs: 60,
            generation_timeout_secs: 90,
            question_retries: 2,
            generation_retries: 3,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_interval_ms: 18,
            answer_delay_ms: 600,
            completion_pause_ms: 800,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/scriptforge/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("scriptforge"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    pub fn question_timeout(&self) -> Duration {
        Duration::from_secs(self.service.question_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.service.generation_timeout_secs)
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.chat.typing_interval_ms)
    }

    pub fn answer_delay(&self) -> Duration {
        Duration::from_millis(self.chat.answer_delay_ms)
    }

    pub fn completion_pause(&self) -> Duration {
        Duration::from_millis(self.chat.completion_pause_ms)
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("scriptforge").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
