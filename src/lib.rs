//! Herald - Telegram notification gateway for examination results
//!
//! Students register a national ID over chat; Herald validates it
//! against the student directory, confirms the registration, and
//! delivers the formatted result the moment it is published - exactly
//! once per running instance.
//!
//! ## Components
//!
//! - **Roster**: subscriber registry + delivery ledger behind one lock
//! - **Store**: result store and student directory adapters (MongoDB or
//!   a flat JSON snapshot file)
//! - **Dispatcher**: the atomic check-ledger / send / mark-ledger unit
//! - **Handler**: inbound identifier submissions
//! - **Watcher**: polling and change-feed strategies for discovering
//!   newly published results
//! - **Transport**: Telegram Bot API client (sendMessage + getUpdates)

pub mod config;
pub mod db;
pub mod dispatch;
pub mod handler;
pub mod notifier;
pub mod roster;
pub mod store;
pub mod transport;
pub mod types;
pub mod watcher;

pub use config::Args;
pub use dispatch::Dispatcher;
pub use handler::{Outcome, RegistrationHandler};
pub use notifier::Notifier;
pub use roster::Roster;
pub use types::{HeraldError, Result};
