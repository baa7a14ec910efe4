use std::path::Path;
use time::macros::format_description;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;

const LOG_FILE: &str = "mr.log";

/// Installs the global subscriber.
///
/// Logs go to stderr unless `log_dir` is given, in which case they are
/// appended to `<log_dir>/mr.log` through a non-blocking writer. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init_logger(level: Level, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let builder = tracing_subscriber::fmt()
        .with_timer(timer)
        .with_max_level(level)
        .with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    }
}
