use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with file locations shown and the environment section hidden.
///
/// Call early in `main()`. Later calls are ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info"
    } else {
        "debug"
    }
}

/// Initialize tracing with an [`ErrorLayer`](tracing_error::ErrorLayer) for span capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON events, no targets
/// - **Development** (default): pretty, human-readable output
///
/// `RUST_LOG` overrides the default filter. Safe to call more than once; later
/// calls leave the installed subscriber in place.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(environment = ?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
