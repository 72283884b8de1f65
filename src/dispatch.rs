//! Delivery dispatch - the at-most-once unit
//!
//! Every delivery path (the immediate post-registration check and both
//! watcher strategies) goes through [`Dispatcher::deliver_pending`],
//! which holds the roster lock across the whole check / send / mark
//! sequence. Two concurrent observers of the same result therefore
//! cannot both pass the ledger check, and a failed send leaves the
//! identifier unmarked and eligible for the next cycle.

use std::sync::Arc;

use crate::db::schemas::ResultDoc;
use crate::notifier::Notifier;
use crate::roster::Roster;
use crate::types::Result;

/// Shared delivery dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    roster: Arc<Roster>,
    notifier: Notifier,
}

impl Dispatcher {
    /// Create a dispatcher over the shared roster and notifier
    pub fn new(roster: Arc<Roster>, notifier: Notifier) -> Self {
        Self { roster, notifier }
    }

    /// The shared roster
    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    /// Deliver a result if its identifier has a subscriber and has not
    /// been delivered yet.
    ///
    /// Returns `Ok(true)` when a notification went out, `Ok(false)` when
    /// there was nothing to do. The ledger is marked only after the
    /// transport confirms the send; a `Delivery` error propagates with
    /// the ledger untouched.
    pub async fn deliver_pending(&self, national_id: &str, result: &ResultDoc) -> Result<bool> {
        let mut state = self.roster.lock().await;

        let Some(chat) = state.subscriber(national_id) else {
            return Ok(false);
        };
        if state.is_delivered(national_id) {
            return Ok(false);
        }

        // The lock is held across the send: the ledger check and mark
        // must be one atomic unit per identifier.
        self.notifier.deliver(chat, result).await?;
        state.mark_delivered(national_id);

        Ok(true)
    }
}
