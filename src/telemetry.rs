use tracing::{subscriber::set_global_default, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::configuration::{LogFormat, LogSettings};

// Per-statement sqlx logs and connection-level client chatter drown the request spans.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=warn", "reqwest=warn", "h2=warn"];

pub fn filter_directives(level: &str) -> String {
    std::iter::once(level.trim())
        .filter(|level| !level.is_empty())
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

fn env_filter(log: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&log.level)))
}

/// Human readable output for local runs.
pub fn get_subscriber<Sink>(log: &LogSettings, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let format_layer = fmt::Layer::default()
        .with_target(true)
        .with_ansi(true)
        .with_writer(sink);
    Registry::default().with(env_filter(log)).with(format_layer)
}

/// Bunyan JSON output, one object per line.
pub fn get_json_subscriber<Sink>(
    name: String,
    log: &LogSettings,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter(log))
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("Failed to set logger");
    set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Installs the subscriber picked by `log.format`, writing to stdout.
pub fn init_telemetry(name: &str, log: &LogSettings) {
    match log.format {
        LogFormat::Pretty => init_subscriber(get_subscriber(log, std::io::stdout)),
        LogFormat::Json => {
            init_subscriber(get_json_subscriber(name.to_string(), log, std::io::stdout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::filter_directives;

    #[test]
    fn test_filter_keeps_level_first_and_quiets_clients() {
        assert_eq!(
            filter_directives("debug"),
            "debug,sqlx=warn,hyper=warn,reqwest=warn,h2=warn"
        );
    }

    #[test]
    fn test_blank_level_falls_back_to_quiet_targets() {
        assert_eq!(
            filter_directives("  "),
            "sqlx=warn,hyper=warn,reqwest=warn,h2=warn"
        );
    }
}
