use std::sync::Arc;

use content_firewall::bus::{Dispatcher, LogStore};
use content_firewall::config::{PipelineConfig, PolicyConfig};
use content_firewall::pipeline::{LogPublisher, Pipeline, TemplateAuthor};
use content_firewall::policy::PolicyEvaluator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from_env()?;
    let policy = PolicyConfig::resolve(&config)?;

    eprintln!("🛡️  Content Firewall v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Message log: {} (keeps {})",
        config.log_path.display(),
        config.log_capacity
    );
    match &config.policy_path {
        Some(path) => eprintln!("   Policy: {}", path.display()),
        None => eprintln!("   Policy: built-in terms"),
    }
    eprintln!("   Personas: {}", policy.personas.join(", "));

    // ── Bus ─────────────────────────────────────────────────────────────
    let bus = Arc::new(Dispatcher::with_store(
        LogStore::new(config.log_path.clone()),
        config.log_capacity,
    ));
    if !bus.is_empty() {
        eprintln!("   Restored {} logged messages", bus.len());
    }

    // ── Pipeline ────────────────────────────────────────────────────────
    let pipeline = Arc::new(Pipeline::wire(
        bus,
        Arc::new(PolicyEvaluator::new(&policy)),
        Arc::new(TemplateAuthor),
        Arc::new(LogPublisher),
    ));

    eprintln!("   Paste one JSON idea per line, or /help. /quit to exit.\n");
    content_firewall::cli::run(pipeline).await?;

    Ok(())
}
