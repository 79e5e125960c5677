use crate::error::{CliError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// `-q` wins over any number of `-v`.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

/// Creates the log file, along with any missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(File::create(path)?)
}

/// Installs the global subscriber: a compact stderr layer with run-relative timestamps, plus
/// a plain-text file layer carrying targets and span context when `log_file` is given.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let file_layer = match log_file.as_deref() {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(level_filter(verbosity, quiet))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::uptime())
                .with_target(false)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;
    use tracing::{debug, info};

    #[test]
    fn quiet_overrides_verbosity() {
        let levels: Vec<_> = (0..5).map(|v| level_filter(v, false)).collect();
        assert_eq!(
            levels,
            vec![
                LevelFilter::WARN,
                LevelFilter::INFO,
                LevelFilter::DEBUG,
                LevelFilter::TRACE,
                LevelFilter::TRACE,
            ]
        );
        assert_eq!(level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn log_file_parents_are_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs").join("relax.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn log_file_under_a_regular_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let result = open_log_file(&blocker.join("relax.log"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    #[serial]
    fn file_layer_records_epoch_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("relax.log");
        let layer = fmt::layer()
            .with_writer(Mutex::new(open_log_file(&path).unwrap()))
            .with_ansi(false);
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(layer);

        tracing::subscriber::with_default(subscriber, || {
            debug!(epoch = 7, loss = 0.25, "Epoch complete.");
            tracing::trace!("filtered out");
        });

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Epoch complete."));
        assert!(content.contains("epoch=7"));
        assert!(content.contains("loss=0.25"));
        assert!(!content.contains("filtered out"));
    }

    #[test]
    #[serial]
    fn second_install_is_reported() {
        let first = setup_logging(1, false, None);
        info!("logger installed");
        let second = setup_logging(1, false, None);
        assert!(first.is_ok() || matches!(first, Err(CliError::Other(_))));
        assert!(matches!(second, Err(CliError::Other(_))));
    }
}
