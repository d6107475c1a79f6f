//! Tracing subscriber setup

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install a formatted subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call repeatedly; returns false if another subscriber was already
/// installed by the host program.
pub fn init_logging() -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .try_init()
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init_logging();
        assert_eq!(init_logging(), first);
    }
}
