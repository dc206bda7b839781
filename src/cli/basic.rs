//! Basic walkthrough: save, peek, load and validate an app config.

use crate::codec::Codec;
use crate::error::ErrorKind;
use crate::validate::{Versioned, validate};
use anyhow::{Context, Result, bail};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Arguments for the basic subcommand
#[derive(Args, Debug)]
pub struct BasicArgs {
    /// File name for the example config, relative to --dir
    #[arg(long, default_value = "app_config.json")]
    pub file: String,

    /// Keep the example config on disk afterwards
    #[arg(long)]
    pub keep: bool,
}

/// Example application config. Serialized field names are PascalCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    pub version: String,
    pub app_name: String,
    pub debug: bool,
    #[serde(rename = "DatabaseURL")]
    pub database_url: String,
    pub max_retries: u32,
    pub allowed_hosts: Vec<String>,
}

impl Versioned for AppConfig {
    fn version(&self) -> &str {
        &self.version
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            app_name: "My CLI App".to_string(),
            debug: false,
            database_url: "postgres://localhost/myapp".to_string(),
            max_retries: 3,
            allowed_hosts: vec!["localhost".to_string(), "example.com".to_string()],
        }
    }
}

/// A config without a `Version` field; saving it must fail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidConfig {
    name: String,
    port: u16,
}

/// Run the walkthrough in `dir`. Returns the loaded config.
pub fn run_basic(args: &BasicArgs, dir: &Path, codec: &Codec) -> Result<AppConfig> {
    let path = dir.join(&args.file);
    let config = AppConfig::default();

    println!("Saving configuration...");
    codec
        .save(&config, &path)
        .with_context(|| format!("failed to save config to {}", path.display()))?;
    println!("Configuration saved to {}", path.display());

    let version = codec.peek_version(&path)?;
    println!("Config file version: {}", version);

    println!();
    println!("Loading configuration...");
    let loaded: AppConfig = codec
        .load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    print_app_config(&loaded);

    println!();
    println!("Validating configuration struct...");
    validate(&loaded).context("config validation failed")?;
    println!("Configuration is valid!");

    println!();
    println!("Trying to save invalid configuration (no Version field)...");
    let invalid = InvalidConfig {
        name: "test".to_string(),
        port: 8080,
    };
    let invalid_path = dir.join("invalid.json");
    match codec.save(&invalid, &invalid_path) {
        Err(err) if err.kind() == ErrorKind::MissingVersionField => {
            println!("Expected error: {} ({})", err, err.kind());
        }
        Err(err) => return Err(err).context("unexpected error saving invalid config"),
        Ok(()) => bail!("saving a config without a Version field succeeded"),
    }

    if !args.keep {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        debug!(path = %path.display(), "removed example config");
    }

    Ok(loaded)
}

fn print_app_config(config: &AppConfig) {
    println!("Loaded configuration:");
    println!("  Version: {}", config.version);
    println!("  App Name: {}", config.app_name);
    println!("  Debug: {}", config.debug);
    println!("  Database URL: {}", config.database_url);
    println!("  Max Retries: {}", config.max_retries);
    println!("  Allowed Hosts: {:?}", config.allowed_hosts);
}
