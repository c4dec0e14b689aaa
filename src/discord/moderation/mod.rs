// Discord side of the moderation engine: message addressing, embeds, and the
// notifier/enforcer adapters the core calls through its ports.

pub mod embeds;
pub mod enforcer;
pub mod message_ref;
pub mod notifier;

pub use enforcer::DiscordEnforcer;
pub use message_ref::MessageRef;
pub use notifier::DiscordNotifier;
