use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `synth.yosys_binary`
pub const YOSYS_BINARY_ENV: &str = "YOSYS_BINARY";

pub const DEFAULT_CONFIG_FILE: &str = "collector.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_repos_file")]
    pub repos_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,
    #[serde(default)]
    pub keep_clones: bool,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_github_base")]
    pub github_base: String,
    #[serde(default)]
    pub synth: SynthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default = "default_yosys_binary")]
    pub yosys_binary: String,
    #[serde(default = "default_plugin")]
    pub plugin: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_repos_file() -> PathBuf {
    PathBuf::from("repos.txt")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("rtl")
}

fn default_clone_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("collector.log")
}

fn default_github_base() -> String {
    "https://github.com".to_string()
}

fn default_yosys_binary() -> String {
    "yosys".to_string()
}

fn default_plugin() -> String {
    "systemverilog".to_string()
}

fn default_timeout() -> u64 {
    1000
}

fn default_extensions() -> Vec<String> {
    vec!["sv".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos_file: default_repos_file(),
            output_dir: default_output_dir(),
            clone_dir: default_clone_dir(),
            keep_clones: false,
            log_file: default_log_file(),
            github_base: default_github_base(),
            synth: SynthConfig::default(),
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            yosys_binary: default_yosys_binary(),
            plugin: default_plugin(),
            timeout_secs: default_timeout(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Load config from file, returns defaults if the file doesn't exist.
    ///
    /// `YOSYS_BINARY` in the environment takes precedence over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_yosys_override(std::env::var(YOSYS_BINARY_ENV).ok());
        Ok(config)
    }

    /// Replace the yosys binary unless `value` is missing or blank
    fn apply_yosys_override(&mut self, value: Option<String>) {
        if let Some(binary) = value {
            if !binary.trim().is_empty() {
                self.synth.yosys_binary = binary;
            }
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }
}
