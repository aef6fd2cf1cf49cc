//! Mail value types — provider-agnostic shapes the pipeline operates on.
//!
//! The provider adapter translates its native payloads into these types,
//! isolating the pipeline from provider schema drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordered header name/value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHeader {
    pub name: String,
    pub value: String,
}

/// An unread inbound message, immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEmail {
    /// Provider-assigned message id.
    pub id: String,
    /// RFC 5322 Message-ID header (may be empty).
    pub message_id: String,
    /// Provider thread id.
    pub thread_id: String,
    /// Raw From header value.
    pub from: String,
    /// To recipients.
    pub to: Vec<String>,
    /// CC recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Subject line; `"No Subject"` when the header is missing.
    pub subject: String,
    /// Plain-text body (HTML-flattened when no plain part exists).
    pub body: String,
    /// Provider-supplied preview snippet.
    pub snippet: String,
    /// All headers in provider order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<EmailHeader>,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

/// Header-only summary of a sent message, used for response matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEmailSummary {
    pub id: String,
    pub subject: String,
    /// Recipient addresses, lowercased.
    pub recipients: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

/// Extract a bare email address from a `Name <addr>` form, or return the
/// raw string lowercased if no angle-bracket form is present.
pub fn extract_address(raw: &str) -> String {
    if let (Some(start), Some(end)) = (raw.find('<'), raw.rfind('>'))
        && end > start
    {
        return raw[start + 1..end].trim().to_lowercase();
    }
    raw.trim().to_lowercase()
}
