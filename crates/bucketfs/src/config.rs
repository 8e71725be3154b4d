// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Contents manager configuration
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! checkpoint_dir: .ipynb_checkpoints
//! max_list_size: 1024
//! hide_globs: ["__pycache__", "*.pyc"]
//! retry:
//!   max_retries: 2
//! ```

use crate::glob::HideSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Bounded retry applied to store calls that fail transiently
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// First backoff delay (default: 100)
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Backoff ceiling (default: 2000)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> usize {
    1
}
fn default_min_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentsConfig {
    /// Directory name holding checkpoints beside each document
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// Store every checkpoint in this container instead of the document's
    #[serde(default)]
    pub checkpoint_container: Option<String>,

    /// Page size for directory listings
    #[serde(default = "default_max_list_size")]
    pub max_list_size: usize,

    /// Keep container handles between calls
    #[serde(default = "default_true")]
    pub cache_containers: bool,

    /// Treat names starting with `.` as hidden
    #[serde(default = "default_true")]
    pub hide_dotted_objects: bool,

    /// Name patterns left out of directory listings
    #[serde(default = "default_hide_globs")]
    pub hide_globs: Vec<String>,

    #[serde(default = "default_untitled_directory")]
    pub untitled_directory: String,

    #[serde(default = "default_untitled_file")]
    pub untitled_file: String,

    #[serde(default = "default_untitled_notebook")]
    pub untitled_notebook: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_checkpoint_dir() -> String {
    ".ipynb_checkpoints".to_string()
}
fn default_max_list_size() -> usize {
    1024
}
fn default_true() -> bool {
    true
}
fn default_hide_globs() -> Vec<String> {
    [
        "__pycache__",
        "*.pyc",
        "*.pyo",
        ".DS_Store",
        "*.so",
        "*.dylib",
        "*~",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}
fn default_untitled_directory() -> String {
    "untitled-folder".to_string()
}
fn default_untitled_file() -> String {
    "untitled".to_string()
}
fn default_untitled_notebook() -> String {
    "Untitled".to_string()
}

impl Default for ContentsConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            checkpoint_container: None,
            max_list_size: default_max_list_size(),
            cache_containers: true,
            hide_dotted_objects: true,
            hide_globs: default_hide_globs(),
            untitled_directory: default_untitled_directory(),
            untitled_file: default_untitled_file(),
            untitled_notebook: default_untitled_notebook(),
            retry: RetryConfig::default(),
        }
    }
}

impl ContentsConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_list_size == 0 {
            return Err(ConfigError::Invalid("max_list_size must be positive".into()));
        }
        if self.checkpoint_dir.is_empty() || self.checkpoint_dir.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "checkpoint_dir must be a single path segment, got {:?}",
                self.checkpoint_dir
            )));
        }
        if let Some(container) = &self.checkpoint_container
            && (container.is_empty() || container.contains('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "checkpoint_container must be a container name, got {container:?}"
            )));
        }
        for name in [
            &self.untitled_directory,
            &self.untitled_file,
            &self.untitled_notebook,
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "untitled names must be a single path segment, got {name:?}"
                )));
            }
        }
        _ = self.hide_set()?;
        Ok(())
    }

    /// Compiled [`ContentsConfig::hide_globs`]
    pub fn hide_set(&self) -> Result<HideSet, ConfigError> {
        HideSet::compile(&self.hide_globs)
            .map_err(|bad| ConfigError::Invalid(format!("bad hide glob {bad:?}")))
    }
}
