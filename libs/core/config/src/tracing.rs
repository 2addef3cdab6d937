use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

const DEVELOPMENT_FILTER: &str = "info,domain_events=debug,events_admin_api=debug";
const PRODUCTION_FILTER: &str = "info,mongodb=warn";

/// Install color-eyre for the binary's error reports.
///
/// Shows the file:line where errors occur and hides the environment section.
/// Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware formatting and span capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON lines, no targets.
/// - **Development** (default): pretty, human-readable output.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is a
/// no-op after the first successful initialization (common in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if is_production {
            PRODUCTION_FILTER
        } else {
            DEVELOPMENT_FILTER
        })
    });

    let result = if is_production {
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
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
