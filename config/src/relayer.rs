use relayer_robin::{NamedParticipant, Participant, ScoreSeed};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{constants::*, env::Environment};

/// Service configuration read from `relayer.yml`.
///
/// Every section except `signers` falls back to its defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayerConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub environment: Environment,
    pub signers: Vec<NamedParticipant>,
    #[serde(default)]
    pub robin: RobinConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobinConfig {
    #[serde(default = "default_advance_buffer")]
    pub advance_buffer: usize,
    #[serde(default)]
    pub seed: ScoreSeed,
}

impl Default for RobinConfig {
    fn default() -> Self {
        Self {
            advance_buffer: DEFAULT_ADVANCE_BUFFER,
            seed: ScoreSeed::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            interval_ms: DEFAULT_INTERVAL_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_advance_buffer() -> usize {
    DEFAULT_ADVANCE_BUFFER
}

fn default_attempts() -> usize {
    DEFAULT_ATTEMPTS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

/// Config file path: the explicit one, then `RELAYER_CONFIG_FILE`, then `relayer.yml`
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env::var_os(CONFIG_FILE_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

impl RelayerConfig {
    pub fn from_yaml(content: &str) -> eyre::Result<Self> {
        let config: RelayerConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Read the file, apply environment overrides and validate
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Unable to read config {}: {e}", path.display()))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> eyre::Result<()> {
        if let Ok(level) = env::var(LOG_LEVEL_VAR) {
            self.log_level = level;
        }
        if let Some(environment) = Environment::from_env()? {
            self.environment = environment;
        }
        Ok(())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.signers.is_empty() {
            eyre::bail!("At least one signer must be configured");
        }

        let mut seen = HashSet::new();
        for signer in &self.signers {
            if signer.id.trim().is_empty() {
                eyre::bail!("Signer id cannot be empty");
            }
            if !seen.insert(signer.id.as_str()) {
                eyre::bail!("Signer {} is configured more than once", signer.id);
            }
        }

        if self.runner.interval_ms == 0 {
            eyre::bail!("runner.interval_ms must be at least 1");
        }
        if self.runner.attempts == 0 {
            eyre::bail!("runner.attempts must be at least 1");
        }
        if self.robin.advance_buffer == 0 {
            eyre::bail!("robin.advance_buffer must be at least 1");
        }

        Ok(())
    }

    pub fn participants(&self) -> Vec<Arc<dyn Participant>> {
        self.signers
            .iter()
            .cloned()
            .map(NamedParticipant::shared)
            .collect()
    }

    pub fn to_json(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
