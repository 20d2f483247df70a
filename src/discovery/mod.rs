pub mod udev_discovery;

use std::path::PathBuf;
use thiserror::Error;

pub use udev_discovery::UdevDiscovery;

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub devnode: PathBuf,
    pub name: String,
    pub num_slots: usize,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("udev error: {0}")]
    Udev(#[from] std::io::Error),
    #[error("no multitouch device found")]
    NotFound,
}

pub trait DeviceDiscovery {
    /// Event nodes whose capabilities satisfy
    /// [`is_multitouch`](crate::capabilities::is_multitouch).
    fn find_multitouch() -> Result<Vec<DeviceInfo>, DiscoveryError>;
}
