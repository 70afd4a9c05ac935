use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Build the level filter. Debug logging lets `RUST_LOG` override the level.
fn filter(debug: bool) -> EnvFilter {
    // With debug logging off we force `info` regardless of `RUST_LOG` so a
    // stray variable in the user's environment cannot make output verbose.
    let level = if debug { "debug" } else { "info" };

    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    }
}

fn file_appender(path: &Path) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?.to_string_lossy().into_owned();
    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(err) => {
            eprintln!("log file {} unavailable: {err}", path.display());
            None
        }
    }
}

/// Initialise logging to stdout and, when `log_file` is set, append the same
/// lines to that file. Only the first call in a process takes effect.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let filter = filter(debug);

    match log_file.as_deref().and_then(file_appender) {
        Some(appender) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(appender))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
    }
}
