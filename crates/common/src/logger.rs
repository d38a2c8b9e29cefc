use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "debug,hyper_util=warn,reqwest=warn";
const LOG_FILE_PREFIX: &str = "dashboard.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. `RUST_LOG` wins over the built-in filter.
///
/// Output goes to stderr. Use [`setup_file_logger`] when the terminal view
/// owns the tty, otherwise log lines tear through the redrawn frame.
pub fn setup_logger() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        // .with_file(true)
        // .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(env_filter())
        .init();
}

/// Same filter as [`setup_logger`], written to a daily file under `log_dir`.
///
/// The returned guard flushes the background writer on drop; keep it alive
/// for the lifetime of the process.
pub fn setup_file_logger(log_dir: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_env_filter(env_filter())
        .init();

    guard
}
