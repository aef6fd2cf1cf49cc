//! Configuration types.

/// Triage pipeline configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Trailing window for unread inbox messages, in hours.
    pub unread_window_hours: u32,
    /// Trailing window for sent-mail summaries, in days.
    pub sent_window_days: u32,
    /// Maximum number of messages fetched per listing.
    pub max_results: u32,
    /// Time-to-live for both cache slots, in seconds.
    pub cache_ttl_secs: u64,
    /// Per-message body cap sent to the classifier.
    pub body_snippet_chars: usize,
    /// Body preview length in the rendered report.
    pub preview_chars: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            unread_window_hours: 24,
            sent_window_days: 7,
            max_results: 50,
            cache_ttl_secs: 1800, // 30 minutes
            body_snippet_chars: 2000,
            preview_chars: 300,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(hours) = env_parse("TRIAGE_UNREAD_WINDOW_HOURS") {
            config.unread_window_hours = hours;
        }
        if let Some(days) = env_parse("TRIAGE_SENT_WINDOW_DAYS") {
            config.sent_window_days = days;
        }
        if let Some(max) = env_parse("TRIAGE_MAX_RESULTS") {
            config.max_results = max;
        }
        if let Some(ttl) = env_parse("TRIAGE_CACHE_TTL_SECS") {
            config.cache_ttl_secs = ttl;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_windows() {
        let config = TriageConfig::default();
        assert_eq!(config.unread_window_hours, 24);
        assert_eq!(config.sent_window_days, 7);
        assert_eq!(config.max_results, 50);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.body_snippet_chars, 2000);
        assert_eq!(config.preview_chars, 300);
    }
}
