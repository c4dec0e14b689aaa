// Implementations of the moderation ports.

pub mod in_memory;
pub mod log_notifier;
pub mod moderator_stats;
pub mod sqlite_moderator_stats;
pub mod sqlite_report_store;

// Re-export for convenience
pub use in_memory::InMemoryReportStore;
pub use log_notifier::{LogEnforcer, LogNotifier};
pub use moderator_stats::InMemoryModeratorStats;
pub use sqlite_moderator_stats::SqliteModeratorStats;
pub use sqlite_report_store::SqliteReportStore;
