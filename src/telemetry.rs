use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const DEFAULT_FILTER: &str = "toast_store=info,toastctl=info,warn";

/// Installs the global tracing subscriber.
///
/// Filter precedence: `explicit_filter`, then `RUST_LOG`, then a default that
/// keeps this crate at `info`. Logs go to stderr so stdout stays free for
/// snapshot output.
///
/// # Errors
///
/// Returns an error if JSON output is requested without the `json-logs`
/// feature, or if a global subscriber is already installed.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let filter = resolve_filter(explicit_filter, std::env::var("RUST_LOG").ok().as_deref())?;

    #[cfg(feature = "json-logs")]
    if use_json {
        let subscriber = Registry::default().with(filter).with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .flatten_event(true),
        );
        return tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| Error::Telemetry(err.to_string()));
    }

    #[cfg(not(feature = "json-logs"))]
    if use_json {
        return Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        ));
    }

    let subscriber = Registry::default().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| Error::Telemetry(err.to_string()))
}

/// First candidate that parses wins; invalid ones are skipped.
fn resolve_filter(explicit: Option<&str>, from_env: Option<&str>) -> Result<EnvFilter> {
    explicit
        .into_iter()
        .chain(from_env)
        .chain(std::iter::once(DEFAULT_FILTER))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}
