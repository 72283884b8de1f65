//! Result change watchers
//!
//! Two interchangeable strategies discover newly published or corrected
//! results and push them through the dispatcher:
//!
//! - [`poll`]: enumerate the full result set on a fixed interval. No
//!   incremental diffing is needed - the delivery ledger already
//!   excludes everything sent before.
//! - [`feed`]: drain a bounded channel of change events produced by the
//!   store's change stream.
//!
//! Both loops run until shutdown and survive any per-cycle failure.

pub mod feed;
pub mod poll;

pub use feed::spawn_feed_watcher;
pub use poll::spawn_poll_watcher;
