//! Personal travel log library
//!
//! This library stores trips as one directory per trip, each holding a
//! `metadata.json` record and the trip's attachments, and computes travel
//! statistics over them.

mod cli;
mod config;
mod diagnostics;
mod errors;
mod helper;
mod stats;
mod storage;
mod trip;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use diagnostics::*;
pub use errors::*;
pub use helper::*;
pub use stats::*;
pub use storage::*;
pub use trip::*;
pub use types::*;
