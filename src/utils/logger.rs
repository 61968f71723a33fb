use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::ClientError;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Default)]
struct JsonFieldVisitor {
    fields: Map<String, Value>,
}

impl Visit for JsonFieldVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), Value::from(format!("{:?}", value)));
    }
}

/// One JSON object per line. `event_name` and `request_id` are lifted out of the
/// attributes so log pipelines can index refresh and queue events directly.
struct JsonLineFormatter;

fn severity_number(level: &Level) -> u64 {
    match *level {
        Level::TRACE => 1,
        Level::DEBUG => 5,
        Level::INFO => 9,
        Level::WARN => 13,
        Level::ERROR => 17,
    }
}

impl<S, N> FormatEvent<S, N> for JsonLineFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut attributes = visitor.fields;
        let body = attributes
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| metadata.name().to_string());

        let mut root = Map::new();
        root.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        root.insert("level".to_string(), Value::from(metadata.level().as_str()));
        root.insert(
            "severity_number".to_string(),
            Value::from(severity_number(metadata.level())),
        );
        root.insert("service".to_string(), Value::from(SERVICE_NAME));
        root.insert("version".to_string(), Value::from(SERVICE_VERSION));
        root.insert("target".to_string(), Value::from(metadata.target()));
        for key in ["event_name", "request_id"] {
            if let Some(v) = attributes.remove(key) {
                root.insert(key.to_string(), v);
            }
        }
        root.insert("message".to_string(), Value::from(body));
        if !attributes.is_empty() {
            root.insert("fields".to_string(), Value::Object(attributes));
        }

        let serialized = serde_json::to_string(&Value::Object(root)).map_err(|_| std::fmt::Error)?;
        writer.write_str(&serialized)?;
        writer.write_char('\n')
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, ClientError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => Err(ClientError::Config(format!(
            "invalid logging.level '{}'; valid values: trace, debug, info, warn, error, off",
            level
        ))),
    }
}

/// Install the global subscriber. `RUST_LOG` directives refine the configured level.
///
/// Calling this twice is an error; the first subscriber stays installed.
pub fn init_logging(logging_config: &LoggingConfig) -> Result<(), ClientError> {
    let level_filter = parse_level(&logging_config.level)?;
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .from_env_lossy();

    // Logs go to stderr so command output on stdout stays clean.
    let result = match logging_config.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .event_format(JsonLineFormatter),
            )
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_writer(std::io::stderr).pretty())
            .try_init(),
    };
    result.map_err(|e| ClientError::Config(format!("failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(" Debug ").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(matches!(parse_level("verbose"), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_invalid_level_is_rejected_before_install() {
        let config = LoggingConfig {
            level: "loud".to_string(),
            format: "json".to_string(),
        };
        assert!(init_logging(&config).is_err());
    }
}
