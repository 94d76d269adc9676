use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
fn default_filter(level: &str) -> String {
    format!("retireplan={level},retireplan_core=warn")
}

/// Initialize logging to stderr, or to `log_file` when given.
///
/// Stdout is reserved for the JSON results. The log level can be controlled
/// via the `level` parameter or the `RUST_LOG` environment variable, which
/// takes precedence.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> color_eyre::Result<()> {
    let (writer, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init()?;

    match log_file {
        Some(path) => {
            tracing::info!("retireplan logging initialized (log_path={})", path.display())
        }
        None => tracing::debug!("retireplan logging initialized (stderr)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_library() {
        assert_eq!(
            default_filter("debug"),
            "retireplan=debug,retireplan_core=warn"
        );
        assert!(EnvFilter::try_new(default_filter("info")).is_ok());
    }
}
