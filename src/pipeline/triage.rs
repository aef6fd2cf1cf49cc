//! Triage engine — cache-coherent fetch/classify, reconcile, rank, report.
//!
//! Per-request state machine:
//! 1. Email slot: cache read unless forced, fresh fetch on miss
//! 2. Verdict slot: consulted only when the email set came from cache —
//!    a freshly fetched email set can never pair with a stale verdict cache
//! 3. Reconcile verdicts against emails by id; orphans are flagged, not dropped
//! 4. Stable rank of the needs-response list
//! 5. Plain-text report render

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::TriageConfig;
use crate::error::{Error, MailActionError};
use crate::mail::{InboundEmail, MailSource};
use crate::pipeline::classifier::BatchClassifier;
use crate::pipeline::response_match::is_already_responded;
use crate::pipeline::types::{AnalyzedEmail, ClassificationVerdict, TriageEntry, TriageOutput};
use crate::store::{CacheStore, EMAIL_CACHE_KEY, VERDICT_CACHE_KEY, cache_get, cache_put};

/// Triage engine over injected mail, classifier, and cache dependencies.
pub struct TriageEngine {
    mail: Arc<dyn MailSource>,
    classifier: BatchClassifier,
    cache: Arc<dyn CacheStore>,
    config: TriageConfig,
}

impl TriageEngine {
    pub fn new(
        mail: Arc<dyn MailSource>,
        classifier: BatchClassifier,
        cache: Arc<dyn CacheStore>,
        config: TriageConfig,
    ) -> Self {
        Self {
            mail,
            classifier,
            cache,
            config,
        }
    }

    /// Run one triage pass.
    pub async fn triage(&self, force_refresh: bool) -> Result<TriageOutput, Error> {
        info!(force_refresh, "Starting triage run");

        // Step 1: email set
        let mut emails_from_cache = false;
        let cached_emails: Option<Vec<InboundEmail>> = if force_refresh {
            None
        } else {
            cache_get(self.cache.as_ref(), EMAIL_CACHE_KEY).await
        };

        let emails = match cached_emails {
            Some(cached) => {
                debug!(count = cached.len(), "Email cache hit");
                emails_from_cache = true;
                cached
            }
            None => {
                let fresh = self
                    .mail
                    .fetch_unread(self.config.unread_window_hours)
                    .await?;
                cache_put(
                    self.cache.as_ref(),
                    EMAIL_CACHE_KEY,
                    &fresh,
                    self.config.cache_ttl_secs,
                )
                .await;
                fresh
            }
        };

        // Step 2: verdicts. A fresh email set invalidates the verdict slot
        // even if that slot itself has not expired.
        let analysis_must_be_fresh = force_refresh || !emails_from_cache;
        let cached_verdicts: Option<Vec<ClassificationVerdict>> = if analysis_must_be_fresh {
            None
        } else {
            cache_get(self.cache.as_ref(), VERDICT_CACHE_KEY).await
        };

        let verdicts = match cached_verdicts {
            Some(cached) => {
                debug!(count = cached.len(), "Verdict cache hit");
                cached
            }
            None => {
                let fresh = self.classifier.classify(&emails).await?;
                cache_put(
                    self.cache.as_ref(),
                    VERDICT_CACHE_KEY,
                    &fresh,
                    self.config.cache_ttl_secs,
                )
                .await;
                fresh
            }
        };

        // Step 3: reconcile. Sent mail is always fetched fresh — response
        // activity changes independently of cache windows.
        let sent = self.mail.fetch_sent(self.config.sent_window_days).await?;

        let mut analyzed = Vec::with_capacity(verdicts.len());
        let mut needs_response = Vec::new();

        for verdict in &verdicts {
            match emails.iter().find(|e| e.id == verdict.email_id) {
                Some(email) => {
                    analyzed.push(AnalyzedEmail::matched(email, verdict));
                    if verdict.needs_response {
                        needs_response.push(TriageEntry {
                            email: email.clone(),
                            verdict: verdict.clone(),
                            already_responded: is_already_responded(email, &sent),
                        });
                    }
                }
                None => {
                    warn!(email_id = %verdict.email_id, "Verdict references no fetched email");
                    analyzed.push(AnalyzedEmail::orphan(verdict));
                }
            }
        }

        // Step 4: rank
        rank_entries(&mut needs_response);

        // Step 5: render
        let now = Utc::now();
        let report = render_report(&needs_response, self.config.preview_chars, now);

        info!(
            analyzed = analyzed.len(),
            needs_response = needs_response.len(),
            from_cache = emails_from_cache,
            "Triage run complete"
        );

        Ok(TriageOutput {
            last_updated: now,
            num_emails: emails.len(),
            needs_response_emails: needs_response,
            report,
            analyzed_emails: analyzed,
        })
    }

    /// Trash a message, then scrub it from both cache slots so a later
    /// cache-hit triage does not resurrect it.
    ///
    /// Cache scrub failures are logged only — the trash already succeeded
    /// and the delete must not fail after the fact.
    pub async fn delete_email(&self, id: &str) -> Result<(), MailActionError> {
        self.mail.trash(id).await?;
        self.scrub_caches(id).await;
        Ok(())
    }

    async fn scrub_caches(&self, id: &str) {
        if let Some(mut emails) =
            cache_get::<Vec<InboundEmail>>(self.cache.as_ref(), EMAIL_CACHE_KEY).await
        {
            let before = emails.len();
            emails.retain(|e| e.id != id);
            if emails.len() != before {
                cache_put(
                    self.cache.as_ref(),
                    EMAIL_CACHE_KEY,
                    &emails,
                    self.config.cache_ttl_secs,
                )
                .await;
                debug!(%id, "Scrubbed email cache entry");
            }
        }

        if let Some(mut verdicts) =
            cache_get::<Vec<ClassificationVerdict>>(self.cache.as_ref(), VERDICT_CACHE_KEY).await
        {
            let before = verdicts.len();
            verdicts.retain(|v| v.email_id != id);
            if verdicts.len() != before {
                cache_put(
                    self.cache.as_ref(),
                    VERDICT_CACHE_KEY,
                    &verdicts,
                    self.config.cache_ttl_secs,
                )
                .await;
                debug!(%id, "Scrubbed verdict cache entry");
            }
        }
    }
}

// ── Ranking ─────────────────────────────────────────────────────────

/// Stable rank: not-yet-responded first, then time-sensitive, then
/// importance severity. Ties keep input order.
pub fn rank_entries(entries: &mut [TriageEntry]) {
    entries.sort_by_key(|entry| {
        (
            entry.already_responded,
            !entry.verdict.time_sensitive,
            entry.verdict.importance,
        )
    });
}

// ── Report rendering ────────────────────────────────────────────────

const DIVIDER: &str = "------------------------------------------------------------";

/// Render the plain-text triage report.
pub fn render_report(
    entries: &[TriageEntry],
    preview_chars: usize,
    generated_at: DateTime<Utc>,
) -> String {
    let mut report = String::new();
    report.push_str("============================================================\n");
    report.push_str(&format!(
        " EMAIL TRIAGE REPORT — generated {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str("============================================================\n");

    if entries.is_empty() {
        report.push_str("No emails requiring immediate response.\n");
        return report;
    }

    for entry in entries {
        report.push('\n');
        report.push_str(&format!("Subject: {}\n", entry.email.subject));
        report.push_str(&format!("From: {}\n", entry.email.from));
        report.push_str(&format!(
            "Received: {}\n",
            entry.email.received_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        report.push_str(&format!("Importance: {}\n", entry.verdict.importance.label()));
        report.push_str(&format!(
            "Time-sensitive: {}\n",
            if entry.verdict.time_sensitive { "yes" } else { "no" }
        ));
        report.push_str(&format!("Topics: {}\n", entry.verdict.topics.join(", ")));
        report.push_str(&format!("Reason: {}\n", entry.verdict.reason));
        if entry.already_responded {
            report.push_str("*** ALREADY RESPONDED ***\n");
        }

        let preview: String = entry.email.body.chars().take(preview_chars).collect();
        report.push_str(&format!("Preview: {preview}\n"));
        report.push_str(DIVIDER);
        report.push('\n');
    }

    report
}
