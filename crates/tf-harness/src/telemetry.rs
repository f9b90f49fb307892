//! Tracing initialisation for harness binaries and test suites.
//!
//! `RUST_LOG` wins when set. Otherwise the harness crates log at `level` and
//! everything else (reqwest, hyper, ...) at `warn`, so a CI log shows the
//! terraform steps without transport noise. Logs go to stderr; stdout is
//! left for command output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const HARNESS_TARGETS: &[&str] = &["tf_harness", "rhcs_e2e", "rhcs_e2e_cli"];

/// Install the global subscriber.
///
/// * `json` - newline-delimited JSON instead of the human format.
/// * `level` - harness verbosity when `RUST_LOG` is not set.
///
/// Only the first call in a process takes effect, so every test may call it.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

fn default_directives(level: Level) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        HARNESS_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level.as_str().to_lowercase())),
    );
    directives.join(",")
}
