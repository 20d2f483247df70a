use crate::touch::TouchEvents;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The incoming event stream can no longer be trusted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("slot index {slot} outside of device range 0..{num_slots}")]
    SlotOutOfRange { slot: i32, num_slots: usize },
    #[error("tracking id {id} held by slots {} and {} at once", slots.0, slots.1)]
    DuplicateTrackingId { id: i32, slots: (usize, usize) },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("open failed: {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("device disconnected: {0}")]
    Disconnected(#[source] io::Error),
    #[error("read error: {0}")]
    Read(#[source] io::Error),
    #[error("grab failed: {0}")]
    Grab(#[source] io::Error),
}

impl SourceError {
    /// Classify a failed read. `ENODEV` is what evdev reports once the
    /// device node has gone away.
    pub fn from_read(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) if code == libc::ENODEV => SourceError::Disconnected(err),
            _ => SourceError::Read(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device {} unavailable: {reason}", path.display())]
    DeviceUnavailable { path: PathBuf, reason: String },
    /// `salvaged` holds the events of batches that were reconciled in the
    /// same read before the stream went bad.
    #[error("corrupt event stream: {error}")]
    DecodeCorruption {
        #[source]
        error: DecodeError,
        salvaged: TouchEvents,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SessionError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SessionError::DeviceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
