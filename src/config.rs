//! Configuration management for forgechain

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub pow: PowConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowConfig {
    /// Leading zero hex characters a sealing digest must carry. Fixed for the
    /// node's lifetime; there is no runtime retargeting.
    #[serde(default = "default_leading_zeros")]
    pub leading_zeros: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    /// Per-peer fetch timeout during resolution; an unresponsive peer is
    /// skipped.
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network: NetworkConfig::default(),
            pow: PowConfig::default(),
            consensus: ConsensusConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            bind_addr: default_bind_addr(),
            api_port: default_api_port(),
            bootstrap_peers: Vec::new(),
        }
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        PowConfig {
            leading_zeros: default_leading_zeros(),
        }
    }
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        ConsensusConfig {
            peer_timeout_secs: default_peer_timeout(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_leading_zeros() -> usize {
    4
}

fn default_peer_timeout() -> u64 {
    3
}

/// Load configuration from `path` (or `config.toml` next to the binary).
/// A missing or empty file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new("config.toml"));
    let config_str = fs::read_to_string(path).unwrap_or_default();
    parse_config(&config_str)
}

fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = if config_str.is_empty() {
        Config::default()
    } else {
        toml::from_str(config_str).map_err(|e| ChainError::ConfigError(e.to_string()))?
    };

    // Validate critical values
    if config.pow.leading_zeros == 0 || config.pow.leading_zeros > 64 {
        return Err(ChainError::ConfigError(
            "pow.leading_zeros must be between 1 and 64".to_string(),
        ));
    }
    if config.consensus.peer_timeout_secs == 0 {
        return Err(ChainError::ConfigError(
            "consensus.peer_timeout_secs must be nonzero".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.network.api_port, 5000);
        assert_eq!(config.network.bind_addr, "0.0.0.0");
        assert!(config.network.bootstrap_peers.is_empty());
        assert_eq!(config.pow.leading_zeros, 4);
        assert_eq!(config.consensus.peer_timeout_secs, 3);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = parse_config(
            r#"
            [network]
            api_port = 6000
            bootstrap_peers = ["10.0.0.1:5000"]
            "#,
        )
        .unwrap();

        assert_eq!(config.network.api_port, 6000);
        assert_eq!(config.network.bootstrap_peers.len(), 1);
        assert_eq!(config.pow.leading_zeros, 4);
    }

    #[test]
    fn out_of_range_difficulty_is_rejected() {
        assert!(parse_config("[pow]\nleading_zeros = 0\n").is_err());
        assert!(parse_config("[pow]\nleading_zeros = 65\n").is_err());
        assert!(parse_config("[consensus]\npeer_timeout_secs = 0\n").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/forgechain.toml"))).unwrap();
        assert_eq!(config.network.api_port, 5000);
    }
}
