// Discord layer - slash commands plus the adapters the moderation engine
// uses to post alerts and act on reported messages.

#[path = "commands/command_catalog.rs"]
pub mod commands;
#[path = "moderation/mod.rs"]
pub mod moderation;

// Re-export command types for convenience
pub use commands::reports::{Data, Error};
