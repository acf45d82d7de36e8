//! Unified logging for debug output.
//!
//! Provides compact timestamped logging with per-module level configuration.
//! Supports `RUST_LOG` environment variable for runtime overrides.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! cluster = "debug" # per-iteration k-means details
//! ```
//!
//! Targets: `pipeline`, `embedding`, `similarity`, `cluster`, `storage`, `cli`.
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug threadmap run
//! RUST_LOG=pipeline=info,cluster=trace threadmap run
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directives for `config`: the default level, then per-target
/// overrides sorted by target so the string is stable between runs.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut targets: Vec<(&String, &String)> = config.modules.iter().collect();
    targets.sort();

    let mut directives = config.default.clone();
    for (target, level) in targets {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Initialize logging once per process; later calls are ignored.
///
/// `RUST_LOG` wins over `config` when set. Output goes to stderr so the
/// statistics table on stdout stays clean for piping.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log an event with stage context. The handler doubles as the log target,
/// so it must be a string literal.
///
/// # Examples
/// ```ignore
/// log_event!("pipeline", "loaded", "{} posts", corpus.len());
/// log_event!("pipeline", "done");
/// ```
#[macro_export]
macro_rules! log_event {
    ($handler:expr, $event:expr) => {
        tracing::info!(target: $handler, "[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!(target: $handler, "[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("embedding", "built", "{} vectors", n);
/// ```
#[macro_export]
macro_rules! debug_event {
    ($handler:expr, $event:expr) => {
        tracing::debug!(target: $handler, "[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!(target: $handler, "[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}
