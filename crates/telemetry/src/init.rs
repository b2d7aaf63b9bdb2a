// Path: crates/telemetry/src/init.rs
use persona_types::config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Filter applied when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes the global `tracing` subscriber, writing to stderr so stdout
/// stays free for command output. Also routes `log` records into `tracing`.
pub fn init_tracing(format: LogFormat) -> Result<(), anyhow::Error> {
    tracing_log::LogTracer::init()?;
    match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339());
            let subscriber = Registry::default().with(env_filter()).with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339());
            let subscriber = Registry::default().with(env_filter()).with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_fails() {
        init_tracing(LogFormat::Json).unwrap();
        tracing::info!(target: "cli", "telemetry ready");
        assert!(init_tracing(LogFormat::Pretty).is_err());
    }
}
