//! Batch classifier — one LLM call per triage run, one verdict per email.
//!
//! The whole batch succeeds or fails together. Verdicts are matched back
//! to emails by id, never by position.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ClassifyError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mail::InboundEmail;
use crate::pipeline::types::{ClassificationVerdict, Importance};

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Max tokens for the batched classification call.
const CLASSIFY_MAX_TOKENS: u32 = 4096;

/// Ellipsis marker appended to truncated body snippets.
const TRUNCATION_MARKER: &str = "…";

/// Batch classifier over an injected LLM provider.
pub struct BatchClassifier {
    llm: Arc<dyn LlmProvider>,
    /// Per-message body cap — bounds outbound payload size regardless of
    /// mailbox content.
    body_snippet_chars: usize,
}

impl BatchClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, body_snippet_chars: usize) -> Self {
        Self {
            llm,
            body_snippet_chars,
        }
    }

    /// Classify a batch of emails in a single call.
    ///
    /// An empty input returns an empty result without contacting the
    /// classification service.
    pub async fn classify(
        &self,
        emails: &[InboundEmail],
    ) -> Result<Vec<ClassificationVerdict>, ClassifyError> {
        if emails.is_empty() {
            debug!("Empty batch — skipping classification call");
            return Ok(Vec::new());
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt()),
            ChatMessage::user(build_batch_prompt(emails, self.body_snippet_chars)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        info!(count = emails.len(), model = self.llm.model_name(), "Classifying email batch");
        let response = self.llm.complete(request).await?;

        let verdicts = parse_verdicts(&response.content)?;
        debug!(verdicts = verdicts.len(), "Parsed classification verdicts");
        Ok(verdicts)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_prompt() -> String {
    "You are an email triage classifier. You receive a JSON array of emails and \
     classify each one.\n\n\
     Respond with ONLY a JSON array containing exactly one object per input email:\n\
     {\"email_id\": \"...\", \"importance\": \"high|medium|low\", \"reason\": \"...\", \
     \"needs_response\": true, \"time_sensitive\": false, \"topics\": [\"...\"]}\n\n\
     Rules:\n\
     - Echo back the exact \"email_id\" of the email each verdict refers to\n\
     - \"importance\" must be one of: high, medium, low\n\
     - \"reason\" is one short sentence explaining the classification\n\
     - \"needs_response\" is true only when the sender expects a reply from the user\n\
     - \"time_sensitive\" is true for deadlines, meetings, or expiring matters\n\
     - \"topics\" is 2-5 short tags describing the content"
        .to_string()
}

/// Shape sent to the classifier for each email.
#[derive(Debug, Serialize)]
struct ClassifierInput<'a> {
    id: &'a str,
    from: &'a str,
    subject: &'a str,
    body_snippet: String,
}

fn build_batch_prompt(emails: &[InboundEmail], snippet_chars: usize) -> String {
    let inputs: Vec<ClassifierInput> = emails
        .iter()
        .map(|email| ClassifierInput {
            id: &email.id,
            from: &email.from,
            subject: &email.subject,
            body_snippet: truncate_body(&email.body, snippet_chars),
        })
        .collect();

    format!(
        "Classify these {} emails:\n{}",
        inputs.len(),
        serde_json::to_string_pretty(&inputs).unwrap_or_default()
    )
}

/// Cap a body at `max_chars` characters, appending an ellipsis marker
/// when truncated.
fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut snippet: String = body.chars().take(max_chars).collect();
    snippet.push_str(TRUNCATION_MARKER);
    snippet
}

// ── Response parsing ────────────────────────────────────────────────

/// Raw verdict as produced by the LLM, before enum validation.
#[derive(Debug, serde::Deserialize)]
struct RawVerdict {
    email_id: String,
    importance: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    needs_response: bool,
    #[serde(default)]
    time_sensitive: bool,
    #[serde(default)]
    topics: Vec<String>,
}

/// Parse the LLM response into verdicts.
///
/// Any parse or enum-validation failure fails the whole batch — there is
/// no partial-batch success. Topic counts outside the 2–5 hint pass
/// through untouched.
fn parse_verdicts(raw: &str) -> Result<Vec<ClassificationVerdict>, ClassifyError> {
    let json = extract_json_array(raw);
    let parsed: Vec<RawVerdict> =
        serde_json::from_str(&json).map_err(|e| ClassifyError::InvalidResponse {
            reason: format!("JSON parse error: {e}"),
        })?;

    parsed
        .into_iter()
        .map(|raw| {
            let importance = match raw.importance.to_lowercase().as_str() {
                "high" => Importance::High,
                "medium" => Importance::Medium,
                "low" => Importance::Low,
                other => {
                    return Err(ClassifyError::InvalidResponse {
                        reason: format!("unknown importance '{other}' for email {}", raw.email_id),
                    });
                }
            };
            Ok(ClassificationVerdict {
                email_id: raw.email_id,
                importance,
                reason: raw.reason,
                needs_response: raw.needs_response,
                time_sensitive: raw.time_sensitive,
                topics: raw.topics,
            })
        })
        .collect()
}

/// Extract a JSON array from LLM output (handles markdown wrapping).
fn extract_json_array(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON array
    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('[') {
                return inner.to_string();
            }
        }
    }

    // Try to find array bounds
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
