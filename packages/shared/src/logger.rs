//! Logging setup for Rakugaki binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// The filter enables `default_log_level` for the server library, the shared
/// crate, `tower_http` and the binary itself. `RUST_LOG` overrides it.
///
/// # Examples
///
/// ```no_run
/// use rakugaki_shared::logger::setup_logger;
///
/// setup_logger("rakugaki_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let binary_target = binary_name.replace('-', "_");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "rakugaki_server={level},rakugaki_shared={level},tower_http={level},{bin}={level}",
                    level = default_log_level,
                    bin = binary_target,
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
