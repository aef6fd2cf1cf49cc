use std::sync::Arc;

use inbox_triage::config::TriageConfig;
use inbox_triage::http::{TriageRouteState, triage_routes};
use inbox_triage::llm::{LlmConfig, create_provider};
use inbox_triage::mail::{GmailConfig, GmailSource};
use inbox_triage::pipeline::{BatchClassifier, TriageEngine};
use inbox_triage::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let port: u16 = std::env::var("TRIAGE_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    // Classifier credential — fail fast, the pipeline is unusable without it.
    let llm_config = LlmConfig::from_env()?;
    let llm = create_provider(&llm_config)?;

    let gmail_config = GmailConfig::from_env()?;
    let mail = Arc::new(GmailSource::new(gmail_config));

    let triage_config = TriageConfig::from_env();

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Triage API:  http://0.0.0.0:{port}/analyze-emails");
    eprintln!("   Triage HTML: http://0.0.0.0:{port}/analyze-emails/html");
    eprintln!(
        "   Windows: unread {}h, sent {}d, cache TTL {}s",
        triage_config.unread_window_hours,
        triage_config.sent_window_days,
        triage_config.cache_ttl_secs
    );

    let classifier = BatchClassifier::new(llm, triage_config.body_snippet_chars);
    let cache = Arc::new(MemoryStore::new());
    let engine = Arc::new(TriageEngine::new(mail, classifier, cache, triage_config));

    let app = triage_routes(TriageRouteState { engine });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(port, "Triage server started");
    axum::serve(listener, app).await?;

    Ok(())
}
