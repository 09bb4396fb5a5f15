// Library interface for ticketsmith-cli so integration tests can reach the
// command parser and the run loops.

pub mod app;
pub mod commands;

pub use commands::{handle_command, CommandResult};
