use super::{DeviceDiscovery, DeviceInfo, DiscoveryError};
use crate::capabilities::{is_multitouch, DeviceCapabilities};
use evdev::Device;
use std::path::PathBuf;
use tracing::{debug, trace};

pub struct UdevDiscovery;

impl DeviceDiscovery for UdevDiscovery {
    fn find_multitouch() -> Result<Vec<DeviceInfo>, DiscoveryError> {
        let mut enumerator = udev::Enumerator::new()?;
        enumerator.match_subsystem("input")?;

        let mut results = Vec::new();

        for device in enumerator.scan_devices()? {
            let sysname = device.sysname().to_string_lossy();
            if !sysname.starts_with("event") {
                continue;
            }

            let Some(devnode) = device.devnode() else {
                continue;
            };

            // unreadable nodes are usually permission problems, not errors
            let caps = match Device::open(devnode)
                .and_then(|dev| DeviceCapabilities::from_device(&dev))
            {
                Ok(caps) => caps,
                Err(e) => {
                    trace!(devnode = %devnode.display(), error = %e, "skipping device");
                    continue;
                }
            };

            if !is_multitouch(&caps) {
                continue;
            }

            debug!(devnode = %devnode.display(), name = %caps.name, "found multitouch device");
            results.push(DeviceInfo {
                devnode: PathBuf::from(devnode),
                num_slots: caps.num_slots().unwrap_or(0),
                name: caps.name,
            });
        }

        if results.is_empty() {
            Err(DiscoveryError::NotFound)
        } else {
            Ok(results)
        }
    }
}
