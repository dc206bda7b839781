//! Versioned configuration files.
//!
//! Every record saved through this crate carries a textual `Version` field,
//! and [`peek_version`] reads just that field so a caller can decide on a
//! migration before picking the shape to [`load`] the full record into.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct StateV1 {
//!     version: String,
//!     roots: Vec<String>,
//! }
//!
//! # fn main() -> vconfig::Result<()> {
//! let state = StateV1 { version: "1".into(), roots: vec!["a".into()] };
//! vconfig::save(&state, ".state.json")?;
//!
//! match vconfig::peek_version(".state.json")?.as_str() {
//!     "1" => {
//!         let state: StateV1 = vconfig::load(".state.json")?;
//!         println!("{} roots", state.roots.len());
//!     }
//!     other => println!("unknown version {other}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codec;
pub mod error;
pub mod format;
mod peek;
pub mod store;
pub mod validate;

pub use codec::{Codec, CodecOptions, load, peek_version, save};
pub use error::{Error, ErrorKind, FormatError, Result, ValidationError};
pub use format::Format;
pub use store::ConfigStore;
pub use validate::{VERSION_FIELD, Versioned, validate, validate_value};
