//! Errors surfaced to the embedder.
//!
//! Only configuration problems are reported this way. Firmware misusing a
//! device sets the status bits real hardware would and is logged.

use std::io;
use std::path::PathBuf;

use nabu_fdc::DiskError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NabuError {
    #[error("ROM image is {0} bytes (expected 4096 or 8192)")]
    InvalidRomSize(usize),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Disk(#[from] DiskError),
}
