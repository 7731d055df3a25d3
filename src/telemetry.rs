use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize tracing for structured logging. JSON output is a config
/// switch; RUST_LOG overrides the configured level either way.
pub fn init_telemetry() -> Result<()> {
    let cfg = crate::config::config()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.observability.log_level.clone()));

    if cfg.observability.json_logs {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    tracing::info!("Leitstand telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the journal entries and
/// notifications one mutation fans out into.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
