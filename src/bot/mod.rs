/// Command dispatcher and transport seam
pub mod dispatcher;
/// Reply formatting
pub mod format;
/// Presence state
pub mod presence;
/// Command parsing
pub mod query;
/// Telegram runtime entrypoint
pub mod runner;
/// Telegram transport
pub mod telegram;

pub use dispatcher::{ChatTransport, CommandDispatcher, InboundMessage};
pub use presence::{Presence, PresenceState};
