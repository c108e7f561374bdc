// Library interface for chatrelay-cli so integration tests can reach the
// command parser. main.rs declares the same file; the path attribute keeps
// it from being loaded twice.

#[path = "commands.rs"]
pub mod commands;

pub use commands::{handle_command, CommandResult};
