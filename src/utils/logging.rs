use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Sends `tracing` output to `path`, appending. The terminal belongs to the
/// UI, so there is no stderr fallback.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unwritable_log_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing_parent = dir.path().join("nope").join("sidebar.log");
        assert!(init_file_logging(&missing_parent).is_err());
    }
}
