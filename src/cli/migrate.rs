//! State file migration workflow.
//!
//! Peeks the version of `.state-<name>.json`, creates a fresh version 2 state
//! when none exists, upgrades a version 1 state in place, and then records
//! simulated progress with periodic checkpoints.

use crate::codec::Codec;
use crate::store::ConfigStore;
use crate::validate::Versioned;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const STATE_VERSION_V1: &str = "1";
pub const STATE_VERSION_V2: &str = "2";

/// Save a checkpoint every this many processed paths.
pub const CHECKPOINT_INTERVAL: usize = 2;

/// Upper bound on peek/upgrade passes before giving up.
const MAX_MIGRATION_PASSES: usize = 4;

/// Arguments for the migrate command.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// State name; the file is `.state-<NAME>.json` in --dir
    #[arg(long, default_value = "example-state")]
    pub name: String,

    /// Roots recorded in a newly created state
    #[arg(value_name = "ROOT", default_values_t = ["root1".to_string(), "root2".to_string()])]
    pub roots: Vec<String>,

    /// Number of paths to process in the progress simulation
    #[arg(long, default_value_t = 5)]
    pub steps: usize,

    /// Keep the state file instead of removing it at the end
    #[arg(long)]
    pub keep: bool,
}

/// Arguments for the seed-v1 command.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// State name; the file is `.state-<NAME>.json` in --dir
    #[arg(long, default_value = "example-state")]
    pub name: String,

    /// Roots recorded in the version 1 state
    #[arg(value_name = "ROOT", default_values_t = ["root1".to_string(), "root2".to_string()])]
    pub roots: Vec<String>,

    /// Checkpoint marker stored in the version 1 state
    #[arg(long, default_value = "")]
    pub checkpoint: String,
}

/// Version 1 of the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateV1 {
    pub version: String,
    pub roots: Vec<String>,
    pub checkpoint: String,
}

impl StateV1 {
    pub fn new(roots: &[String]) -> Self {
        Self {
            version: STATE_VERSION_V1.to_string(),
            roots: roots.to_vec(),
            checkpoint: String::new(),
        }
    }
}

impl Versioned for StateV1 {
    fn version(&self) -> &str {
        &self.version
    }
}

/// Version 2 of the state file, with progress tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateV2 {
    pub version: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub roots: Vec<String>,
    pub total_count: usize,
    pub remaining_count: usize,
    pub paths: Vec<String>,
}

impl StateV2 {
    pub fn new(roots: &[String]) -> Self {
        let now = Utc::now();
        Self {
            version: STATE_VERSION_V2.to_string(),
            create_time: now,
            update_time: now,
            roots: roots.to_vec(),
            total_count: 0,
            remaining_count: 0,
            paths: Vec::new(),
        }
    }

    /// Upgrade a version 1 state. Only the roots carry over.
    pub fn from_v1(old: &StateV1) -> Self {
        Self::new(&old.roots)
    }
}

impl Versioned for StateV2 {
    fn version(&self) -> &str {
        &self.version
    }
}

/// Path of the state file for `name` in `dir`.
pub fn state_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".state-{}.json", name))
}

/// Owns one state file and upgrades it to version 2 on load.
#[derive(Debug)]
pub struct StateManager {
    codec: Codec,
    store: ConfigStore<StateV2>,
}

impl StateManager {
    pub fn new(dir: &Path, name: &str, codec: Codec) -> Self {
        Self {
            codec,
            store: ConfigStore::with_codec(state_file(dir, name), codec),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Load the state, creating it from `roots` when absent and upgrading
    /// older versions first.
    pub fn load_create_migrate(&self, roots: &[String]) -> Result<StateV2> {
        for _ in 0..MAX_MIGRATION_PASSES {
            let version = match self.store.peek_version() {
                Ok(version) => version,
                Err(err) if err.is_not_found() => {
                    println!("No existing config found, creating new v2 config...");
                    let mut state = StateV2::new(roots);
                    self.save(&mut state)?;
                    return Ok(state);
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("failed to read version of {}", self.path().display())
                    });
                }
            };

            match version.as_str() {
                STATE_VERSION_V1 => {
                    println!("Found v1 config, migrating to v2...");
                    let old: StateV1 = self.codec.load(self.path()).with_context(|| {
                        format!("unable to load config version '{}'", version)
                    })?;
                    let mut upgraded = StateV2::from_v1(&old);
                    self.save(&mut upgraded)?;
                    info!(path = %self.path().display(), from = %version, to = STATE_VERSION_V2, "migrated state");
                }
                STATE_VERSION_V2 => {
                    println!("Found v2 config, loading...");
                    let state = self.store.load().with_context(|| {
                        format!("unable to load config version '{}'", version)
                    })?;
                    return Ok(StateV2::clone(&state));
                }
                other => bail!("unknown config version: '{}'", other),
            }
        }

        bail!(
            "{} did not reach version {} after {} passes",
            self.path().display(),
            STATE_VERSION_V2,
            MAX_MIGRATION_PASSES
        )
    }

    /// Stamp the update time, recompute remaining count, and save.
    pub fn save(&self, state: &mut StateV2) -> Result<()> {
        state.update_time = Utc::now();
        state.remaining_count = state.paths.len();
        self.store
            .save(state)
            .with_context(|| format!("failed to save {}", self.path().display()))
    }

    /// Remove the state file and drop any cached copy.
    pub fn clear(&self) -> Result<()> {
        self.store
            .clear()
            .with_context(|| format!("failed to clear {}", self.path().display()))
    }
}

/// Run the migration walkthrough. Returns the final state.
pub fn run_migrate(args: &MigrateArgs, dir: &Path, codec: &Codec) -> Result<StateV2> {
    println!("State Config Migration Example");
    println!("==============================");

    let manager = StateManager::new(dir, &args.name, *codec);
    let mut state = manager
        .load_create_migrate(&args.roots)
        .context("failed to load/create/migrate config")?;

    println!();
    println!("Successfully loaded config version: {}", state.version);
    display_state(&state);

    println!();
    println!("--- Simulating Progress Updates ---");
    for i in 0..args.steps {
        state.paths.push(format!("path/to/file{}.txt", i));
        state.total_count += 1;

        if i % CHECKPOINT_INTERVAL == 0 {
            println!("Checkpoint at file {}", i);
            if let Err(err) = manager.save(&mut state) {
                warn!(error = %err, "failed to save checkpoint");
            }
        }
    }

    manager.save(&mut state).context("failed to save final config")?;

    println!();
    println!("--- Final State ---");
    display_state(&state);

    if !args.keep {
        println!();
        println!("--- Cleaning Up ---");
        manager.clear()?;
        println!("Config cleared successfully");
    }

    Ok(state)
}

/// Write a version 1 state file.
pub fn run_seed(args: &SeedArgs, dir: &Path, codec: &Codec) -> Result<PathBuf> {
    let path = state_file(dir, &args.name);
    let mut state = StateV1::new(&args.roots);
    state.checkpoint = args.checkpoint.clone();

    codec
        .save(&state, &path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote v1 state to {}", path.display());
    Ok(path)
}

fn display_state(state: &StateV2) {
    println!();
    println!("Configuration Details:");
    println!("  Version: {}", state.version);
    println!("  Created: {}", state.create_time.to_rfc3339());
    println!("  Updated: {}", state.update_time.to_rfc3339());
    println!("  Roots: {:?}", state.roots);
    println!("  Total Files: {}", state.total_count);
    println!("  Remaining: {}", state.remaining_count);
    println!("  Paths Processed: {}", state.paths.len());
}
