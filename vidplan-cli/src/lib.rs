// vidplan-cli/src/lib.rs
//
// Library portion of the vidplan CLI application.
// Contains argument definitions, config loading and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{BulkArgs, Cli, Commands, EncodeArgs, PresetsArgs};
pub use commands::bulk::run_bulk;
pub use commands::encode::run_encode;
pub use commands::presets::run_presets;
