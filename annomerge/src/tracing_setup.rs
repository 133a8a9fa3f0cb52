//! Logging setup: a stdout layer plus an optional non-rolling file layer,
//! both filtered by `RUST_LOG` (or `info` if unset).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Must be kept alive for the duration of the program; dropping it stops
/// the background writer thread and silently truncates pending log lines.
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Installs a global subscriber writing to stdout, and additionally to
/// `log_file` if one is given. Safe to call once per process.
pub fn init_tracing(log_file: Option<&Path>) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "annomerge.log".to_string());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LogGuard(guard)
}
