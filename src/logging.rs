//! Log output for the emulator binary: formatted lines go to stdout and, with `--log`, to a
//! file as well.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

use crate::config::ServerConfig;

type SharedFile = Arc<Mutex<File>>;

/// Per-event writer handed to the fmt layer; every copy appends to the same file.
struct TeeWriter {
    file: Option<SharedFile>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Some(file) = &self.file {
            file.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Some(file) = &self.file {
            file.lock().unwrap_or_else(PoisonError::into_inner).flush()?;
        }
        Ok(())
    }
}

fn open_log_file(path: Option<&Path>) -> io::Result<Option<SharedFile>> {
    path.map(|path| File::create(path).map(|file| Arc::new(Mutex::new(file))))
        .transpose()
}

/// Install the global fmt subscriber at `config.log_level`, also writing to `config.log`.
///
/// A subscriber that is already installed is kept.
///
/// # Errors
/// Returns the I/O error if the log file cannot be created.
pub fn init_tracing(config: &ServerConfig) -> io::Result<()> {
    let file = open_log_file(config.log.as_deref())?;
    let level: Level = config.log_level.into();
    let _ = tracing_subscriber::fmt()
        .with_writer(move || TeeWriter { file: file.clone() })
        .with_target(false)
        .with_max_level(level)
        .try_init();
    Ok(())
}
