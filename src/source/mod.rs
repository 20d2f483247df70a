pub mod evdev_source;

use crate::capabilities::DeviceCapabilities;
use crate::error::SourceError;
use evdev::InputEvent;
use std::os::fd::RawFd;
use std::time::Duration;

pub use evdev_source::EvdevSource;

/// Supplies raw kernel input records for one opened device.
pub trait EventSource: Send + 'static {
    fn capabilities(&self) -> Result<DeviceCapabilities, SourceError>;

    /// Append whatever records are available to `out`.
    ///
    /// `timeout` bounds the wait for the device to become readable: `None`
    /// blocks until it does, `Some(Duration::ZERO)` never waits. Returning
    /// without appending anything is not an error.
    fn fetch(
        &mut self,
        timeout: Option<Duration>,
        out: &mut Vec<InputEvent>,
    ) -> Result<(), SourceError>;

    fn grab(&mut self) -> Result<(), SourceError>;
    fn ungrab(&mut self) -> Result<(), SourceError>;

    /// Descriptor that becomes readable when records are pending, for
    /// callers driving their own event loop.
    fn raw_fd(&self) -> Option<RawFd> {
        None
    }
}
