//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The file path
//! defaults to `savedoc.yaml` but can be set with the `-f` flag or the `SAVEDOC_CONFIG`
//! environment variable. A missing file is not an error; every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `savedoc.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SAVEDOC_` override YAML values
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! SAVEDOC_OUTPUT_DIR=/tmp/exports
//! SAVEDOC_DEFAULT_MIME_TYPE=text/plain
//! ```

use std::path::PathBuf;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::request::DEFAULT_MIME_TYPE;

/// CLI args
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SAVEDOC_CONFIG", default_value = "savedoc.yaml")]
    pub config: String,

    /// Validate configuration and exit.
    #[arg(long)]
    pub validate: bool,

    /// File whose bytes should be saved
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Suggested name for the saved document (defaults to the input's file name)
    #[arg(long)]
    pub filename: Option<String>,

    /// MIME type of the document
    #[arg(long)]
    pub mime_type: Option<String>,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory the directory picker saves into
    pub output_dir: PathBuf,
    /// MIME type used when a request does not name one
    pub default_mime_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            default_mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("default_mime_type must not be empty")]
    EmptyMimeType,
    #[error("default_mime_type '{0}' is not of the form type/subtype")]
    MalformedMimeType(String),
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("SAVEDOC_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mime_type = self.default_mime_type.trim();
        if mime_type.is_empty() {
            return Err(ConfigError::EmptyMimeType);
        }
        match mime_type.split_once('/') {
            Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(()),
            _ => Err(ConfigError::MalformedMimeType(self.default_mime_type.clone())),
        }
    }
}
