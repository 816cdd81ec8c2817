use std::env;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Terminal output stays at `warn` by default so it does not fight the
/// progress bar; the log file gets everything down to `TRACING_LEVEL`.
pub fn init_logger() -> impl Drop {
    let stdout_filter = env::var("STDOUT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    let file_filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/locale-duper.log".to_string());

    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true)
                .with_filter(EnvFilter::new(stdout_filter)),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(EnvFilter::new(file_filter)),
        )
        .init();

    debug!("Tracing is configured for terminal and file logging.");

    guard
}
