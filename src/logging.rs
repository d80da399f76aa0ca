//! Operational log setup.
//!
//! `env_logger` with an `info` default (override with `RUST_LOG`).  When a
//! log file is configured every record goes to stderr and is appended to the
//! file as well.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Env, Target};

/// Install the global logger.  Safe to call more than once; later calls are
/// ignored.  A log file that cannot be opened is reported and skipped.
pub fn init(log_file: Option<&Path>) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    let mut file_error = None;
    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(TeeWriter::new(io::stderr(), file))));
            }
            Err(e) => file_error = Some(e),
        }
    }

    if builder.try_init().is_err() {
        return;
    }
    match (log_file, file_error) {
        (Some(path), Some(e)) => log::warn!("cannot open log file {}: {e}", path.display()),
        (Some(path), None) => log::debug!("logging to {}", path.display()),
        _ => {}
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ---------------------------------------------------------------------------
// TeeWriter
// ---------------------------------------------------------------------------

/// Writes everything to `primary` and mirrors it to `secondary`.  Errors from
/// the secondary writer are ignored so a full disk never silences stderr.
pub struct TeeWriter<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        let _ = self.secondary.write_all(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.secondary.flush();
        self.primary.flush()
    }
}
