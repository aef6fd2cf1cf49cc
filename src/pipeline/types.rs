//! Shared types for the triage pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mail::InboundEmail;

/// Sender/subject literal shown for verdicts that reference no fetched email.
pub const ORPHAN_LABEL: &str = "Unknown (AI Mismatch)";

// ── Classification verdict ──────────────────────────────────────────

/// Classifier importance level, ordered by severity.
///
/// Declaration order drives ranking: `High < Medium < Low`, so an
/// ascending sort puts the most important entries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    /// Upper-cased label for the rendered report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Per-email verdict returned by the batch classifier.
///
/// `email_id` echoes the input id so verdicts can be matched back to their
/// emails — result ordering is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub email_id: String,
    pub importance: Importance,
    pub reason: String,
    pub needs_response: bool,
    pub time_sensitive: bool,
    /// Short topic tags. The classifier is asked for 2–5; violations of
    /// the count hint are tolerated.
    pub topics: Vec<String>,
}

// ── Output shapes ───────────────────────────────────────────────────

/// A fully reconciled entry: email, verdict, and response-match result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageEntry {
    pub email: InboundEmail,
    pub verdict: ClassificationVerdict,
    pub already_responded: bool,
}

/// Flat display entry for every verdict, matched or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedEmail {
    pub email_id: String,
    pub from: String,
    pub subject: String,
    pub importance: Importance,
    pub needs_response: bool,
    pub time_sensitive: bool,
    pub topics: Vec<String>,
    pub reason: String,
    /// Set when the verdict referenced an email absent from the fetch batch.
    pub ai_mismatch: bool,
}

impl AnalyzedEmail {
    /// Display entry for a verdict matched to its email.
    pub fn matched(email: &InboundEmail, verdict: &ClassificationVerdict) -> Self {
        Self {
            email_id: verdict.email_id.clone(),
            from: email.from.clone(),
            subject: email.subject.clone(),
            importance: verdict.importance,
            needs_response: verdict.needs_response,
            time_sensitive: verdict.time_sensitive,
            topics: verdict.topics.clone(),
            reason: verdict.reason.clone(),
            ai_mismatch: false,
        }
    }

    /// Display entry for an orphan verdict. Flagged, never ranked — without
    /// the original email body there is nothing to respond to.
    pub fn orphan(verdict: &ClassificationVerdict) -> Self {
        Self {
            email_id: verdict.email_id.clone(),
            from: ORPHAN_LABEL.to_string(),
            subject: ORPHAN_LABEL.to_string(),
            importance: verdict.importance,
            needs_response: verdict.needs_response,
            time_sensitive: verdict.time_sensitive,
            topics: verdict.topics.clone(),
            reason: verdict.reason.clone(),
            ai_mismatch: true,
        }
    }
}

/// Result of one triage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageOutput {
    pub last_updated: DateTime<Utc>,
    /// Ranked entries that still need a response.
    pub needs_response_emails: Vec<TriageEntry>,
    /// Human-readable plain-text report.
    pub report: String,
    /// Every verdict, including orphans.
    pub analyzed_emails: Vec<AnalyzedEmail>,
    /// Number of emails in the fetched set.
    pub num_emails: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_orders_by_severity() {
        assert!(Importance::High < Importance::Medium);
        assert!(Importance::Medium < Importance::Low);
    }

    #[test]
    fn importance_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Importance::High).unwrap(),
            "\"high\""
        );
        let parsed: Importance = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Importance::Medium);
    }

    #[test]
    fn orphan_entry_uses_mismatch_label() {
        let verdict = ClassificationVerdict {
            email_id: "ghost".to_string(),
            importance: Importance::Low,
            reason: "unclear".to_string(),
            needs_response: true,
            time_sensitive: false,
            topics: vec!["misc".to_string()],
        };
        let entry = AnalyzedEmail::orphan(&verdict);
        assert_eq!(entry.from, "Unknown (AI Mismatch)");
        assert_eq!(entry.subject, "Unknown (AI Mismatch)");
        assert!(entry.ai_mismatch);
    }
}
