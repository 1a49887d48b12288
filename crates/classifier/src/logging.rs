use crate::config::ClassifierConfig;
use common::TelemetryGuard;

pub const SERVICE_NAME: &str = "classifier";

/// Install the global subscriber, exporting over OTLP when an endpoint is configured.
///
/// Keep the returned guard alive for the whole process so telemetry is flushed on exit.
pub fn setup_logging(config: &ClassifierConfig) -> anyhow::Result<Option<TelemetryGuard>> {
    match &config.otel_endpoint {
        Some(endpoint) => {
            let guard = TelemetryGuard::init(SERVICE_NAME, endpoint, config.environment.clone())?;
            Ok(Some(guard))
        }
        None => {
            common::setup_logging(config.environment.clone());
            Ok(None)
        }
    }
}
