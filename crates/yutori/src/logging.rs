//! Tracing setup for the `yutori` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is up
//! to the application. [`init_tracing`] is the default used by the CLI.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "yutori=info";

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str = "yutori=debug";

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over `verbose`. Calling this twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing(false);
        init_tracing(true);
        tracing::info!("logging initialized");
    }
}
