//! Mail source adapter — fetches unread and sent mail, trashes messages.

pub mod gmail;
pub mod types;

pub use gmail::{GmailConfig, GmailSource};
pub use types::{EmailHeader, InboundEmail, SentEmailSummary, extract_address};

use async_trait::async_trait;

use crate::error::{FetchError, MailActionError};

/// Trait for mail providers — pure I/O, no triage logic.
///
/// Fetch failures abort the whole operation; there is no per-message retry.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch unread, inbox-scoped messages received within the trailing
    /// window, with full content resolved.
    async fn fetch_unread(&self, window_hours: u32) -> Result<Vec<InboundEmail>, FetchError>;

    /// Fetch header-only summaries of mail sent within the trailing window.
    async fn fetch_sent(&self, window_days: u32) -> Result<Vec<SentEmailSummary>, FetchError>;

    /// Soft-delete a single message by id.
    ///
    /// Surfaces not-found distinctly from permission-denied so callers can
    /// map the outcome to a response code.
    async fn trash(&self, id: &str) -> Result<(), MailActionError>;
}
