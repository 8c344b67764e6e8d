// Discord layer - commands and event handlers.

#[path = "audit/delivery.rs"]
pub mod audit;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "filtering/message_handler.rs"]
pub mod filtering;

// Re-export command types for convenience
pub use commands::{Data, Error};
