//! Logging - stderr subscriber for the library and the CLI
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `ACCOUNT_BRIDGE_LOG` | filter directives, checked first |
//! | `RUST_LOG` | filter directives otherwise |
//! | `ACCOUNT_BRIDGE_LOG_JSON=1` | JSON lines instead of compact text |
//!
//! Without a filter, bridge events log at `info` and dependencies at `warn`.

use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_DIRECTIVES: &str = "warn,account_bridge=info";

const FILTER_ENV: &str = "ACCOUNT_BRIDGE_LOG";
const JSON_ENV: &str = "ACCOUNT_BRIDGE_LOG_JSON";

/// First non-empty directive string, falling back to [`DEFAULT_DIRECTIVES`].
/// Directives that do not parse are dropped for the default.
fn env_filter(candidates: &[Option<String>]) -> EnvFilter {
    candidates
        .iter()
        .flatten()
        .map(|directives| directives.trim())
        .find(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the stderr subscriber. Safe to call twice.
pub fn init_logging() {
    let filter = env_filter(&[std::env::var(FILTER_ENV).ok(), std::env::var(EnvFilter::DEFAULT_ENV).ok()]);
    let use_json = std::env::var(JSON_ENV).map(|value| value == "1").unwrap_or(false);

    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = if use_json { builder.json().try_init() } else { builder.compact().try_init() };
}
