//! Gmail REST adapter — message listing, content resolution, trash.
//!
//! Talks to the Gmail v1 API with a bearer token. Payload shapes are kept
//! private to this module; the rest of the crate only sees `InboundEmail`
//! and `SentEmailSummary`.

use std::sync::OnceLock;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, FetchError, MailActionError};
use crate::mail::MailSource;
use crate::mail::types::{EmailHeader, InboundEmail, SentEmailSummary, extract_address};

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

// ── Configuration ───────────────────────────────────────────────────

/// Gmail adapter configuration.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub access_token: SecretString,
    pub base_url: String,
    /// Listing page cap.
    pub max_results: u32,
}

impl GmailConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("GMAIL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".to_string()))?;

        Ok(Self {
            access_token: SecretString::from(token),
            base_url: std::env::var("GMAIL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            max_results: 50,
        })
    }
}

// ── Adapter ─────────────────────────────────────────────────────────

/// Gmail-backed `MailSource`.
pub struct GmailSource {
    http: reqwest::Client,
    config: GmailConfig,
}

impl GmailSource {
    pub fn new(config: GmailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                operation: operation.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn list_message_ids(
        &self,
        operation: &str,
        query: String,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/users/me/messages", self.config.base_url);
        let list: MessageList = self
            .get_json(
                operation,
                &url,
                &[
                    ("q", query),
                    ("maxResults", self.config.max_results.to_string()),
                ],
            )
            .await?;

        Ok(list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.id)
            .collect())
    }
}

#[async_trait]
impl MailSource for GmailSource {
    async fn fetch_unread(&self, window_hours: u32) -> Result<Vec<InboundEmail>, FetchError> {
        let ids = self
            .list_message_ids(
                "list unread",
                format!("is:unread in:inbox newer_than:{window_hours}h"),
            )
            .await?;

        tracing::debug!(count = ids.len(), "Listed unread messages");

        let fetched_at = Utc::now();
        let mut emails = Vec::with_capacity(ids.len());

        // Full-content gets are issued one at a time, bounding concurrent
        // load on the provider.
        for id in ids {
            let url = format!("{}/users/me/messages/{}", self.config.base_url, id);
            let message: ProviderMessage = self
                .get_json("get message", &url, &[("format", "full".to_string())])
                .await?;

            match to_inbound_email(message, fetched_at) {
                Some(email) => emails.push(email),
                None => {
                    tracing::warn!(%id, "Skipping message without id or thread id");
                }
            }
        }

        tracing::info!(count = emails.len(), "Fetched unread messages");
        Ok(emails)
    }

    async fn fetch_sent(&self, window_days: u32) -> Result<Vec<SentEmailSummary>, FetchError> {
        let ids = self
            .list_message_ids("list sent", format!("in:sent newer_than:{window_days}d"))
            .await?;

        let fetched_at = Utc::now();
        let mut summaries = Vec::with_capacity(ids.len());

        for id in ids {
            let url = format!("{}/users/me/messages/{}", self.config.base_url, id);
            // Header metadata only — subject/recipient matching never needs
            // the body.
            let message: ProviderMessage = self
                .get_json(
                    "get sent metadata",
                    &url,
                    &[
                        ("format", "metadata".to_string()),
                        ("metadataHeaders", "Subject".to_string()),
                        ("metadataHeaders", "To".to_string()),
                        ("metadataHeaders", "Date".to_string()),
                    ],
                )
                .await?;

            if let Some(summary) = to_sent_summary(message, fetched_at) {
                summaries.push(summary);
            }
        }

        tracing::info!(count = summaries.len(), "Fetched sent summaries");
        Ok(summaries)
    }

    async fn trash(&self, id: &str) -> Result<(), MailActionError> {
        let url = format!("{}/users/me/messages/{}/trash", self.config.base_url, id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MailActionError::Request {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(%id, "Trashed message");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(MailActionError::NotFound { id: id.to_string() }),
            StatusCode::FORBIDDEN => Err(MailActionError::PermissionDenied { id: id.to_string() }),
            status => Err(MailActionError::Failed {
                id: id.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

// ── Provider payload shapes ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageList {
    messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProviderMessage {
    id: String,
    thread_id: String,
    snippet: String,
    internal_date: String,
    payload: Option<ProviderPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProviderPart {
    mime_type: String,
    headers: Vec<ProviderHeader>,
    body: ProviderBody,
    parts: Vec<ProviderPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderHeader {
    name: String,
    value: String,
}

// ── Conversion ──────────────────────────────────────────────────────

/// Convert a full-format provider message into an `InboundEmail`.
///
/// Returns `None` when the message has neither an id nor a thread id —
/// it could never be addressed later.
fn to_inbound_email(message: ProviderMessage, fetched_at: DateTime<Utc>) -> Option<InboundEmail> {
    if message.id.is_empty() && message.thread_id.is_empty() {
        return None;
    }

    let headers: Vec<EmailHeader> = message
        .payload
        .as_ref()
        .map(|p| {
            p.headers
                .iter()
                .map(|h| EmailHeader {
                    name: h.name.clone(),
                    value: h.value.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let subject = header_value(&headers, "Subject")
        .unwrap_or("No Subject")
        .to_string();
    let from = header_value(&headers, "From")
        .unwrap_or("Unknown Sender")
        .to_string();
    let to = split_recipients(header_value(&headers, "To").unwrap_or_default());
    let cc = split_recipients(header_value(&headers, "Cc").unwrap_or_default());
    let message_id = header_value(&headers, "Message-ID")
        .unwrap_or_default()
        .to_string();

    let received_at = header_value(&headers, "Date")
        .and_then(parse_date_header)
        .or_else(|| parse_internal_date(&message.internal_date))
        .unwrap_or(fetched_at);

    let body = message
        .payload
        .as_ref()
        .map(resolve_body)
        .unwrap_or_default();

    Some(InboundEmail {
        id: message.id,
        message_id,
        thread_id: message.thread_id,
        from,
        to,
        cc,
        subject,
        body,
        snippet: message.snippet,
        headers,
        received_at,
    })
}

/// Convert a metadata-format sent message into a `SentEmailSummary`.
fn to_sent_summary(message: ProviderMessage, fetched_at: DateTime<Utc>) -> Option<SentEmailSummary> {
    if message.id.is_empty() {
        return None;
    }

    let headers: Vec<EmailHeader> = message
        .payload
        .as_ref()
        .map(|p| {
            p.headers
                .iter()
                .map(|h| EmailHeader {
                    name: h.name.clone(),
                    value: h.value.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let subject = header_value(&headers, "Subject").unwrap_or_default().to_string();
    let recipients = split_recipients(header_value(&headers, "To").unwrap_or_default())
        .iter()
        .map(|r| extract_address(r))
        .filter(|r| !r.is_empty())
        .collect();
    let sent_at = header_value(&headers, "Date")
        .and_then(parse_date_header)
        .or_else(|| parse_internal_date(&message.internal_date))
        .unwrap_or(fetched_at);

    Some(SentEmailSummary {
        id: message.id,
        subject,
        recipients,
        sent_at,
    })
}

/// Case-insensitive header lookup, first match wins.
fn header_value<'a>(headers: &'a [EmailHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .filter(|v| !v.is_empty())
}

fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_date_header(value: &str) -> Option<DateTime<Utc>> {
    // Some providers append a parenthetical zone name rfc2822 won't accept.
    let trimmed = value.split(" (").next().unwrap_or(value).trim();
    DateTime::parse_from_rfc2822(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_internal_date(millis: &str) -> Option<DateTime<Utc>> {
    millis
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

// ── Body resolution ─────────────────────────────────────────────────

/// Resolve message content: prefer a plain-text part, fall back to HTML
/// stripped to flattened text.
fn resolve_body(payload: &ProviderPart) -> String {
    if let Some(data) = find_part_data(payload, "text/plain") {
        return decode_part_data(data);
    }
    if let Some(data) = find_part_data(payload, "text/html") {
        return strip_html(&decode_part_data(data));
    }
    String::new()
}

/// Depth-first search for the first part of the given MIME type with data.
fn find_part_data<'a>(part: &'a ProviderPart, mime_type: &str) -> Option<&'a str> {
    if part.mime_type.starts_with(mime_type)
        && let Some(data) = part.body.data.as_deref()
        && !data.is_empty()
    {
        return Some(data);
    }
    part.parts
        .iter()
        .find_map(|child| find_part_data(child, mime_type))
}

/// Decode base64url part data (padded or unpadded) to text.
fn decode_part_data(data: &str) -> String {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Strip markup from HTML and flatten: tags removed, entity basics decoded,
/// whitespace runs collapsed to single spaces, trimmed.
fn strip_html(html: &str) -> String {
    static BLOCKS: OnceLock<Regex> = OnceLock::new();
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let blocks = BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap()
    });
    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]+>").unwrap());
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());

    let text = blocks.replace_all(html, " ");
    let text = tags.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    spaces.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        URL_SAFE.encode(text)
    }

    fn plain_message(id: &str, body: &str) -> ProviderMessage {
        ProviderMessage {
            id: id.to_string(),
            thread_id: format!("t-{id}"),
            snippet: "preview".to_string(),
            internal_date: String::new(),
            payload: Some(ProviderPart {
                mime_type: "text/plain".to_string(),
                headers: vec![
                    ProviderHeader {
                        name: "From".to_string(),
                        value: "Alice <alice@example.com>".to_string(),
                    },
                    ProviderHeader {
                        name: "Subject".to_string(),
                        value: "Hello".to_string(),
                    },
                    ProviderHeader {
                        name: "Date".to_string(),
                        value: "Tue, 3 Jun 2025 10:52:37 +0200".to_string(),
                    },
                ],
                body: ProviderBody {
                    data: Some(encode(body)),
                },
                parts: vec![],
            }),
        }
    }

    // ── Conversion ──────────────────────────────────────────────

    #[test]
    fn converts_plain_text_message() {
        let email = to_inbound_email(plain_message("m1", "body text"), Utc::now()).unwrap();
        assert_eq!(email.id, "m1");
        assert_eq!(email.subject, "Hello");
        assert_eq!(email.from, "Alice <alice@example.com>");
        assert_eq!(email.body, "body text");
        assert_eq!(email.received_at.to_rfc3339(), "2025-06-03T08:52:37+00:00");
    }

    #[test]
    fn skips_message_without_any_id() {
        let mut message = plain_message("", "body");
        message.thread_id = String::new();
        assert!(to_inbound_email(message, Utc::now()).is_none());
    }

    #[test]
    fn thread_id_alone_is_addressable() {
        let message = plain_message("", "body");
        assert!(to_inbound_email(message, Utc::now()).is_some());
    }

    #[test]
    fn missing_headers_get_defaults() {
        let fetched_at = Utc::now();
        let message = ProviderMessage {
            id: "m2".to_string(),
            thread_id: "t2".to_string(),
            ..Default::default()
        };
        let email = to_inbound_email(message, fetched_at).unwrap();
        assert_eq!(email.subject, "No Subject");
        assert_eq!(email.from, "Unknown Sender");
        assert_eq!(email.received_at, fetched_at);
        assert!(email.body.is_empty());
    }

    #[test]
    fn internal_date_used_when_date_header_missing() {
        let mut message = plain_message("m3", "x");
        message.payload.as_mut().unwrap().headers.retain(|h| h.name != "Date");
        message.internal_date = "1717405957000".to_string();
        let email = to_inbound_email(message, Utc::now()).unwrap();
        assert_eq!(email.received_at.timestamp_millis(), 1_717_405_957_000);
    }

    #[test]
    fn prefers_plain_part_over_html() {
        let message = ProviderMessage {
            id: "m4".to_string(),
            thread_id: "t4".to_string(),
            payload: Some(ProviderPart {
                mime_type: "multipart/alternative".to_string(),
                parts: vec![
                    ProviderPart {
                        mime_type: "text/html".to_string(),
                        body: ProviderBody {
                            data: Some(encode("<p>html version</p>")),
                        },
                        ..Default::default()
                    },
                    ProviderPart {
                        mime_type: "text/plain".to_string(),
                        body: ProviderBody {
                            data: Some(encode("plain version")),
                        },
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let email = to_inbound_email(message, Utc::now()).unwrap();
        assert_eq!(email.body, "plain version");
    }

    #[test]
    fn falls_back_to_stripped_html() {
        let message = ProviderMessage {
            id: "m5".to_string(),
            thread_id: "t5".to_string(),
            payload: Some(ProviderPart {
                mime_type: "text/html".to_string(),
                body: ProviderBody {
                    data: Some(encode(
                        "<html><style>p{color:red}</style><p>Hello   <b>world</b></p></html>",
                    )),
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        let email = to_inbound_email(message, Utc::now()).unwrap();
        assert_eq!(email.body, "Hello world");
    }

    #[test]
    fn sent_summary_lowercases_recipients() {
        let message = ProviderMessage {
            id: "s1".to_string(),
            payload: Some(ProviderPart {
                headers: vec![
                    ProviderHeader {
                        name: "Subject".to_string(),
                        value: "Project Update".to_string(),
                    },
                    ProviderHeader {
                        name: "To".to_string(),
                        value: "Bob Jones <Bob@X.com>, carol@y.com".to_string(),
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let summary = to_sent_summary(message, Utc::now()).unwrap();
        assert_eq!(summary.recipients, vec!["bob@x.com", "carol@y.com"]);
        assert_eq!(summary.subject, "Project Update");
    }

    // ── Body helpers ────────────────────────────────────────────

    #[test]
    fn strip_html_collapses_whitespace() {
        assert_eq!(
            strip_html("<div>a\n\n  b</div>\t<span>c</span>"),
            "a b c"
        );
    }

    #[test]
    fn strip_html_decodes_basic_entities() {
        assert_eq!(strip_html("<p>a &amp; b &lt;c&gt;</p>"), "a & b <c>");
    }

    #[test]
    fn decode_handles_unpadded_base64url() {
        let unpadded = URL_SAFE_NO_PAD.encode("hi there");
        assert_eq!(decode_part_data(&unpadded), "hi there");
    }

    #[test]
    fn date_header_with_zone_comment_parses() {
        let parsed = parse_date_header("Tue, 3 Jun 2025 10:52:37 +0000 (UTC)").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-06-03T10:52:37+00:00");
    }
}
