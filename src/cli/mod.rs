//! CLI command definitions for vconfig
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod basic;
pub mod inspect;
pub mod migrate;

use crate::codec::Codec;
use crate::format::Format;
use basic::BasicArgs;
use clap::{Parser, Subcommand};
use inspect::{CheckArgs, VersionArgs};
use migrate::{MigrateArgs, SeedArgs};
use std::path::PathBuf;

/// Environment variable overriding the default state directory.
pub const DIR_ENV: &str = "VCONFIG_DIR";

/// Versioned config files: peek, check and migration walkthroughs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory for state and demo files (overrides $VCONFIG_DIR, default: .)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Force the stored format (default: from file extension)
    #[arg(short, long, value_enum, ignore_case = true, global = true)]
    pub format: Option<Format>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the version of a config file without loading it
    Version(VersionArgs),

    /// Load a config file as a dynamic document and validate it
    Check(CheckArgs),

    /// Save, peek, load and validate an example app config
    Basic(BasicArgs),

    /// Load, create or migrate a state file to the current version
    Migrate(MigrateArgs),

    /// Write a version 1 state file for the migrate command to upgrade
    SeedV1(SeedArgs),
}

impl Cli {
    /// State directory: `--dir`, then `$VCONFIG_DIR`, then the current directory.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.dir {
            return dir.clone();
        }
        std::env::var(DIR_ENV)
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Codec honoring `--format`.
    pub fn codec(&self) -> Codec {
        self.format.map(Codec::with_format).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_command() {
        let cli = Cli::parse_from(["vconfig", "version", "state.json"]);
        match cli.command {
            Command::Version(args) => assert_eq!(args.file, PathBuf::from("state.json")),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn test_dir_flag_wins() {
        let cli = Cli::parse_from(["vconfig", "--dir", "/tmp/x", "basic"]);
        assert_eq!(cli.state_dir(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_codec_from_format_flag() {
        let cli = Cli::parse_from(["vconfig", "-f", "YAML", "check", "c.conf"]);
        let codec = cli.codec();
        assert_eq!(codec.format_for(std::path::Path::new("c.conf")), Format::Yaml);

        let cli = Cli::parse_from(["vconfig", "--format", "yml", "check", "c.conf"]);
        assert_eq!(cli.format, Some(Format::Yaml));

        let cli = Cli::parse_from(["vconfig", "check", "c.yaml"]);
        assert_eq!(cli.codec(), Codec::default());

        assert!(Cli::try_parse_from(["vconfig", "-f", "toml", "check", "c.conf"]).is_err());
    }

    #[test]
    fn test_migrate_defaults() {
        let cli = Cli::parse_from(["vconfig", "migrate"]);
        match cli.command {
            Command::Migrate(args) => {
                assert_eq!(args.name, "example-state");
                assert_eq!(args.roots, vec!["root1".to_string(), "root2".to_string()]);
                assert!(!args.keep);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
