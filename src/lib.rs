//! Multitouch type B slot protocol decoding.
//!
//! Raw evdev records are buffered per slot by the [`ProtocolDecoder`] until a
//! `SYN_REPORT`, then the [`Reconciler`] compares tracking IDs against the
//! previous report and emits new, updated and finished [`TouchPoint`]s.
//! [`DeviceSession`] ties this to an opened device.

pub mod capabilities;
pub mod decoder;
pub mod discovery;
pub mod error;
pub mod reconcile;
pub mod session;
pub mod slots;
pub mod source;
pub mod touch;
pub mod track;

#[cfg(test)]
mod test_support;

pub use capabilities::{is_multitouch, AxisRange, DeviceCapabilities, REQUIRED_MT_AXES};
pub use decoder::{Decoded, ProtocolDecoder};
pub use error::{DecodeError, SessionError, SourceError};
pub use reconcile::Reconciler;
pub use session::{DeviceSession, SessionConfig, StopReason, DEFAULT_POLL_TIMEOUT};
pub use slots::{SlotData, SlotTable};
pub use source::{EvdevSource, EventSource};
pub use touch::{TouchEvents, TouchPoint, TouchSink, TRACKING_ID_NONE};
pub use track::{TouchTrack, TrackBook, DEFAULT_FINISHED_TRACKS};
