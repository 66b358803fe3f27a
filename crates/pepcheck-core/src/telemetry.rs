//! Tracing subscriber setup.
//!
//! Log lines always go to stderr. `pepcheck` prints records, compliance
//! results and rule listings on stdout, so piping that output into another
//! tool never picks up log noise.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON lines; `level` is the default
/// verbosity when `RUST_LOG` is unset.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
        tracing::info!("still logging");
    }
}
