use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine-wide settings, usually loaded once per experiment.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub decode: DecodeConfig,

    #[serde(default)]
    pub grammar: GrammarConfig,
}

/// Limits applied while decoding genotypes and evaluating trees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodeConfig {
    /// How many times the codon cursor may wrap back to the start of the
    /// genotype. `0` disables genotype reuse.
    #[serde(default = "default_max_wraps")]
    pub max_wraps: u32,

    /// Deepest node allowed, the root being at depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Node evaluations allowed per `evaluate` call or per tick.
    #[serde(default = "default_max_eval_steps")]
    pub max_eval_steps: u64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_wraps: default_max_wraps(),
            max_depth: default_max_depth(),
            max_eval_steps: default_max_eval_steps(),
        }
    }
}

impl DecodeConfig {
    pub fn with_max_wraps(mut self, max_wraps: u32) -> Self {
        self.max_wraps = max_wraps;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_eval_steps(mut self, max_eval_steps: u64) -> Self {
        self.max_eval_steps = max_eval_steps;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 {
            return Err(ConfigError::invalid("max_depth", "must be at least 1"));
        }
        if self.max_eval_steps == 0 {
            return Err(ConfigError::invalid("max_eval_steps", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrammarConfig {
    /// Log warnings for legal but suspicious grammars.
    #[serde(default = "default_true")]
    pub warnings: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            warnings: default_true(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.decode.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: EngineConfig = serde_json::from_reader(reader)?;
        config.decode.validate()?;
        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn default_max_wraps() -> u32 {
    2
}

fn default_max_depth() -> usize {
    64
}

fn default_max_eval_steps() -> u64 {
    1_000_000
}

fn default_true() -> bool {
    true
}
