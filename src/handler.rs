//! Registration handling
//!
//! Reacts to inbound chat messages. Any non-command text is treated as
//! a national ID submission: validate against the student directory,
//! register the chat, and deliver the result immediately when it is
//! already published.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::schemas::StudentDoc;
use crate::dispatch::Dispatcher;
use crate::store::{ResultStore, StudentDirectory};
use crate::transport::ChatId;
use crate::types::Result;

/// Welcome text for the /start command
pub const WELCOME_TEXT: &str =
    "Welcome! Send your national ID to register and receive your examination result automatically.";

/// Response for identifiers absent from the directory
pub const NOT_FOUND_TEXT: &str =
    "This national ID was not found. Please contact support if you believe this is a mistake.";

/// What happened with an inbound message
#[derive(Debug, Clone)]
pub enum Outcome {
    /// /start command - reply with the static welcome
    Welcome,
    /// Unrecognized command - ignored, no reply
    Ignored,
    /// Identifier absent from the student directory, nothing registered
    NotFound,
    /// Registered and the result was delivered on the spot
    Delivered,
    /// Registered; result not yet published, reply with a confirmation
    Registered(StudentDoc),
}

impl Outcome {
    /// Text to send back for this outcome, if any.
    /// A delivery already carried the result message, so nothing more is sent.
    pub fn reply_text(&self) -> Option<String> {
        match self {
            Outcome::Welcome => Some(WELCOME_TEXT.to_string()),
            Outcome::Ignored => None,
            Outcome::NotFound => Some(NOT_FOUND_TEXT.to_string()),
            Outcome::Delivered => None,
            Outcome::Registered(student) => Some(confirmation_text(student)),
        }
    }
}

/// Registration confirmation echoing the directory record
pub fn confirmation_text(student: &StudentDoc) -> String {
    format!(
        "Your national ID {} has been registered.\n\n\
         Your details:\n\
         Name: {}\n\
         School: {}\n\
         Division: {}\n\
         Governorate: {}\n\n\
         You will receive your result here as soon as it is published.",
        student.national_id, student.name, student.school, student.admin_division, student.governorate,
    )
}

/// Handles inbound identifier submissions
#[derive(Clone)]
pub struct RegistrationHandler {
    directory: Arc<dyn StudentDirectory>,
    store: Arc<dyn ResultStore>,
    dispatcher: Dispatcher,
}

impl RegistrationHandler {
    /// Create a handler over the directory, result store, and dispatcher
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        store: Arc<dyn ResultStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            directory,
            store,
            dispatcher,
        }
    }

    /// Handle one inbound message from a chat.
    ///
    /// Directory lookup failures propagate as `Store` errors (the caller
    /// logs and the student retries). A result-store failure or a failed
    /// immediate send never undoes the registration - the watcher picks
    /// the identifier up on a later cycle.
    pub async fn handle(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let text = text.trim();

        if text == "/start" || text.starts_with("/start ") {
            return Ok(Outcome::Welcome);
        }
        if text.starts_with('/') {
            // Only /start is supported; other commands are not identifier
            // submissions and get no reply
            return Ok(Outcome::Ignored);
        }

        let national_id = text;
        let Some(student) = self.directory.get(national_id).await? else {
            info!(chat = chat, national_id = %national_id, "Unknown identifier submitted");
            return Ok(Outcome::NotFound);
        };

        // Always rebind, even when the id was already registered:
        // last write wins.
        let previous = self
            .dispatcher
            .roster()
            .register(national_id, chat)
            .await;
        if let Some(prev) = previous.filter(|p| *p != chat) {
            info!(
                national_id = %national_id,
                previous_chat = prev,
                chat = chat,
                "Registration moved to a new chat"
            );
        }

        match self.store.get(national_id).await {
            Ok(Some(result)) => match self.dispatcher.deliver_pending(national_id, &result).await {
                Ok(true) => {
                    info!(chat = chat, national_id = %national_id, "Result delivered at registration");
                    return Ok(Outcome::Delivered);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        chat = chat,
                        national_id = %national_id,
                        "Immediate delivery failed, watcher will retry: {}", e
                    );
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(
                    national_id = %national_id,
                    "Result lookup failed at registration, watcher will retry: {}", e
                );
            }
        }

        Ok(Outcome::Registered(student))
    }
}
