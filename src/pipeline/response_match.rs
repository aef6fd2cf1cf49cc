//! Response-match filter — has an inbound email already been answered?
//!
//! Pure string matching over sent-mail summaries, no LLM calls. The match
//! is intentionally permissive: subject-line mutations by mail clients
//! (Re:/Fwd: prefixes, truncation) should not hide an existing reply.

use std::sync::OnceLock;

use regex::Regex;

use crate::mail::{InboundEmail, SentEmailSummary, extract_address};

/// Strip a single leading `Re:` or `Fwd:` prefix (case-insensitive),
/// lowercase, and trim.
pub fn normalize_subject(subject: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX.get_or_init(|| Regex::new(r"(?i)^(re|fwd):\s*").unwrap());

    prefix.replace(subject.trim(), "").to_lowercase().trim().to_string()
}

/// True when any sent summary lists the sender among its recipients and
/// its normalized subject equals, contains, or is contained by the
/// inbound normalized subject.
///
/// Substring matching can false-positive on short generic subjects; that
/// tradeoff favors marking-as-responded over re-surfacing answered mail.
pub fn is_already_responded(email: &InboundEmail, sent: &[SentEmailSummary]) -> bool {
    let sender = extract_address(&email.from);
    if sender.is_empty() {
        return false;
    }
    let subject = normalize_subject(&email.subject);

    sent.iter().any(|summary| {
        if !summary.recipients.iter().any(|r| r == &sender) {
            return false;
        }
        let sent_subject = normalize_subject(&summary.subject);
        sent_subject == subject
            || sent_subject.contains(&subject)
            || subject.contains(&sent_subject)
    })
}
