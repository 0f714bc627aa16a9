//! CLI for the `poe-bot` binary.
//!
//! - Argument parsing
//! - Version display
//! - Project scaffolding (`init`)
//!
//! Interactive prompts live in the binary; everything here is testable
//! without a terminal.

pub mod args;
pub mod init;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use init::{init, project_name, InitOptions, ScaffoldError};
pub use version::{version_string, VERSION};
