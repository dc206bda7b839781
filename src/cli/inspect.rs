//! `version` and `check` subcommands.

use crate::codec::Codec;
use crate::validate::find_version_field;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

/// Arguments for the version subcommand
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Config file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Summary printed by `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub version: String,
    pub fields: Vec<String>,
}

/// Print the version stored in a config file.
pub fn run_version(args: &VersionArgs, codec: &Codec) -> Result<String> {
    let version = codec.peek_version(&args.file)?;
    println!("{}", version);
    Ok(version)
}

/// Load a config file without a known shape and validate it.
pub fn run_check(args: &CheckArgs, codec: &Codec) -> Result<CheckReport> {
    let doc: Value = codec
        .load(&args.file)
        .with_context(|| format!("{} is not a valid versioned config", args.file.display()))?;
    // load() validated the document, so the version entry is a string
    let version = doc
        .as_object()
        .and_then(find_version_field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut fields: Vec<String> = doc
        .as_object()
        .map(|fields| fields.keys().cloned().collect())
        .unwrap_or_default();
    fields.sort();

    println!("{}: valid", args.file.display());
    println!("  Version: {}", version);
    println!("  Fields:  {}", fields.join(", "));

    Ok(CheckReport { version, fields })
}
