//! Roster - subscriber registry and delivery ledger
//!
//! One service object owns both maps behind a single lock so the
//! check-ledger / send / mark-ledger sequence can be made atomic with
//! respect to concurrent delivery paths (an immediate post-registration
//! check racing a watcher cycle for the same identifier).
//!
//! Both containers are volatile: a restart drops registrations and the
//! ledger together, so pending subscriptions are lost but a stale
//! ledger can never cause a duplicate send.

use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, MutexGuard};

use crate::transport::ChatId;

/// Mutable roster state, guarded by `Roster`'s lock
#[derive(Debug, Default)]
pub struct RosterState {
    /// National ID -> chat that receives the notification (last write wins)
    subscribers: HashMap<String, ChatId>,
    /// National IDs whose result has already been delivered
    delivered: HashSet<String>,
}

impl RosterState {
    /// Bind an identifier to a chat, replacing any prior binding.
    /// Returns the previous chat if one existed.
    pub fn register(&mut self, national_id: &str, chat: ChatId) -> Option<ChatId> {
        self.subscribers.insert(national_id.to_string(), chat)
    }

    /// Look up the chat registered for an identifier
    pub fn subscriber(&self, national_id: &str) -> Option<ChatId> {
        self.subscribers.get(national_id).copied()
    }

    /// Whether a result has already been delivered for this identifier
    pub fn is_delivered(&self, national_id: &str) -> bool {
        self.delivered.contains(national_id)
    }

    /// Mark an identifier as delivered. Idempotent; returns true only
    /// when the mark is new.
    pub fn mark_delivered(&mut self, national_id: &str) -> bool {
        self.delivered.insert(national_id.to_string())
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of delivered identifiers
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }
}

/// Shared subscriber registry + delivery ledger
#[derive(Debug, Default)]
pub struct Roster {
    state: Mutex<RosterState>,
}

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the roster lock.
    ///
    /// Delivery paths hold this guard across the outbound send so that
    /// two concurrent observers of the same result cannot both pass the
    /// `is_delivered` check.
    pub async fn lock(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().await
    }

    /// Register a subscriber for an identifier (idempotent upsert)
    pub async fn register(&self, national_id: &str, chat: ChatId) -> Option<ChatId> {
        self.state.lock().await.register(national_id, chat)
    }

    /// Look up the chat registered for an identifier
    pub async fn subscriber(&self, national_id: &str) -> Option<ChatId> {
        self.state.lock().await.subscriber(national_id)
    }

    /// Whether a result has already been delivered for this identifier
    pub async fn is_delivered(&self, national_id: &str) -> bool {
        self.state.lock().await.is_delivered(national_id)
    }

    /// Mark an identifier as delivered (idempotent)
    pub async fn mark_delivered(&self, national_id: &str) -> bool {
        self.state.lock().await.mark_delivered(national_id)
    }

    /// Number of registered subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscriber_count()
    }

    /// Number of delivered identifiers
    pub async fn delivered_count(&self) -> usize {
        self.state.lock().await.delivered_count()
    }
}
