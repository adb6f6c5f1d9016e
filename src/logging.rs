//! Logging setup.
//!
//! The library only emits [`tracing`] events. Binaries install a subscriber
//! with [`setup_logging`] and wrap each request in [`request_span`].

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive such as `"info"` or
/// `"txquery=debug"`; `RUST_LOG` wins when set. Installing twice is a no-op.
pub fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
    }
}

/// Span for one request; every transaction event inside carries its id.
pub fn request_span(request_id: &str, method: &str) -> tracing::Span {
    tracing::info_span!("request", id = request_id, method = method)
}
