use super::EventSource;
use crate::capabilities::DeviceCapabilities;
use crate::error::SourceError;
use evdev::{Device, InputEvent};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Raw events straight from an evdev device node.
///
/// evdev opens the node non-blocking; waiting is done with `poll(2)` on the
/// descriptor so a timeout can bound every fetch.
pub struct EvdevSource {
    device: Device,
}

impl EvdevSource {
    pub fn open(device_path: &Path) -> Result<Self, SourceError> {
        let device = Device::open(device_path).map_err(|source| SourceError::Open {
            path: device_path.to_path_buf(),
            source,
        })?;
        debug!(path = %device_path.display(), name = device.name().unwrap_or("unknown"), "opened evdev device");
        Ok(Self { device })
    }

    fn wait_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let timeout_ms = timeout_millis(timeout);
        let mut pollfd = libc::pollfd {
            fd: self.device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        loop {
            let ret = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if pollfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
                return Err(io::Error::from_raw_os_error(libc::ENODEV));
            }
            return Ok(ret > 0);
        }
    }
}

impl EventSource for EvdevSource {
    fn capabilities(&self) -> Result<DeviceCapabilities, SourceError> {
        DeviceCapabilities::from_device(&self.device).map_err(SourceError::Read)
    }

    fn fetch(
        &mut self,
        timeout: Option<Duration>,
        out: &mut Vec<InputEvent>,
    ) -> Result<(), SourceError> {
        if !self.wait_readable(timeout).map_err(SourceError::from_read)? {
            return Ok(());
        }
        match self.device.fetch_events() {
            Ok(events) => {
                out.extend(events);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(SourceError::from_read(e)),
        }
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        self.device.grab().map_err(SourceError::Grab)
    }

    fn ungrab(&mut self) -> Result<(), SourceError> {
        self.device.ungrab().map_err(SourceError::Grab)
    }

    fn raw_fd(&self) -> Option<RawFd> {
        Some(self.device.as_raw_fd())
    }
}

/// `poll(2)` timeout: `-1` blocks, and a non-zero wait never rounds down to
/// a busy `0`.
fn timeout_millis(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(t) => t
            .as_nanos()
            .div_ceil(1_000_000)
            .min(libc::c_int::MAX as u128) as libc::c_int,
    }
}
