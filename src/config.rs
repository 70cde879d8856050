//! Configuration management for ChutCoin

use crate::error::ChainError;
use crate::miner::MAX_DIFFICULTY;
use crate::transaction::Amount;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// Required leading zero hex characters in a block hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_mining_reward")]
    pub mining_reward: Amount,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Give up after this many nonces. Unbounded when absent.
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            max_attempts: None,
        }
    }
}

fn default_difficulty() -> u32 {
    2
}

fn default_mining_reward() -> Amount {
    100
}

/// Upper bound on the per-block reward. Keeps the minted supply of any
/// realistically long chain inside `Amount`.
pub const MAX_MINING_REWARD: Amount = 1_000_000_000;

fn default_threads() -> usize {
    1
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ChainError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.chain.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(self.chain.difficulty));
        }
        if self.chain.mining_reward <= 0 {
            return Err(ChainError::ConfigError(
                "chain.mining_reward must be greater than zero".to_string(),
            ));
        }
        if self.chain.mining_reward > MAX_MINING_REWARD {
            return Err(ChainError::ConfigError(format!(
                "chain.mining_reward must not exceed {}",
                MAX_MINING_REWARD
            )));
        }
        if self.miner.threads == 0 {
            return Err(ChainError::ConfigError(
                "miner.threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads a TOML config file, falling back to defaults when the file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let source = fs::read_to_string(path)?;
    Config::from_toml_str(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chain.difficulty, 2);
        assert_eq!(config.chain.mining_reward, 100);
        assert_eq!(config.miner.threads, 1);
        assert_eq!(config.miner.max_attempts, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("[chain]\ndifficulty = 3\n").unwrap();
        assert_eq!(config.chain.difficulty, 3);
        assert_eq!(config.chain.mining_reward, 100);
        assert_eq!(config.miner, MinerConfig::default());
    }

    #[test]
    fn test_mining_reward_is_capped() {
        let at_cap = format!("[chain]\nmining_reward = {}\n", MAX_MINING_REWARD);
        assert!(Config::from_toml_str(&at_cap).is_ok());

        let huge = format!("[chain]\nmining_reward = {}\n", i64::MAX);
        assert!(matches!(
            Config::from_toml_str(&huge),
            Err(ChainError::ConfigError(msg)) if msg.contains("must not exceed")
        ));

        let mut config = Config::default();
        config.chain.mining_reward = i64::MAX;
        assert!(crate::blockchain::Blockchain::with_config(&config).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            Config::from_toml_str("[chain]\ndifficulty = 65\n"),
            Err(ChainError::InvalidDifficulty(65))
        );
        assert!(matches!(
            Config::from_toml_str("[chain]\nmining_reward = 0\n"),
            Err(ChainError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[miner]\nthreads = 0\n"),
            Err(ChainError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_toml_str("chain = 5"),
            Err(ChainError::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[miner]\nthreads = 4\nmax_attempts = 1000").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.miner.threads, 4);
        assert_eq!(config.miner.max_attempts, Some(1000));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
