//! vconfig command line tool
//!
//! Peeks and checks versioned config files, and runs the save/load and
//! state migration walkthroughs.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::process::ExitCode;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;
use vconfig::cli::{Cli, Command, basic, inspect, migrate};

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Append so repeated runs share one log
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_logging(&cli)?;

    let codec = cli.codec();
    let dir = cli.state_dir();
    debug!(dir = %dir.display(), format = ?codec.options().format, "starting");

    match cli.command {
        Command::Version(args) => {
            inspect::run_version(&args, &codec)?;
        }
        Command::Check(args) => {
            inspect::run_check(&args, &codec)?;
        }
        Command::Basic(args) => {
            basic::run_basic(&args, &dir, &codec)?;
        }
        Command::Migrate(args) => {
            migrate::run_migrate(&args, &dir, &codec)?;
        }
        Command::SeedV1(args) => {
            migrate::run_seed(&args, &dir, &codec)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<vconfig::Error>() {
                Some(inner) => eprintln!("error[{}]: {:#}", inner.kind(), err),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
