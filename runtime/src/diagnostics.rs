//! Tracing setup and the pool statistics log

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;
use std::time::{SystemTime, UNIX_EPOCH};

use lispy::PoolStats;
use tracing::debug;

use crate::error::DriverError;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=lispy=debug`.
/// Output goes to stderr so it never mixes with program output. Safe to
/// call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// One line of the memory log
pub fn pool_log_line(stats: PoolStats, timestamp: u64) -> String {
    format!(
        "[{timestamp}] Total Allocs: {} | Free Objects: {} | Active Objects: {}",
        stats.allocations,
        stats.free,
        stats.active()
    )
}

/// Append the current pool statistics to the log at `path`
pub fn append_pool_log(path: &Path, stats: PoolStats) -> Result<(), DriverError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let io_error = |source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)?;
    writeln!(log, "{}", pool_log_line(stats, timestamp)).map_err(io_error)?;
    debug!(path = %path.display(), ?stats, "appended pool statistics");
    Ok(())
}

/// Append to the log if one is configured, reporting failures on stderr
pub fn record_pool_stats(path: Option<&Path>, stats: PoolStats) {
    if let Some(path) = path
        && let Err(e) = append_pool_log(path, stats)
    {
        eprintln!("Warning: {e}");
    }
}
