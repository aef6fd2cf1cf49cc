//! Email triage pipeline.
//!
//! One triage request flows through:
//! 1. `MailSource::fetch_unread()` — provider I/O, cached with a TTL
//! 2. `BatchClassifier::classify()` — one LLM call for the whole batch
//! 3. `response_match` — already-answered detection against fresh sent mail
//! 4. `TriageEngine` — cache coherence, reconciliation, ranking, report

pub mod classifier;
pub mod response_match;
pub mod triage;
pub mod types;

pub use classifier::BatchClassifier;
pub use triage::TriageEngine;
pub use types::{
    AnalyzedEmail, ClassificationVerdict, Importance, TriageEntry, TriageOutput,
};
