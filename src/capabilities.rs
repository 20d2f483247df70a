//! Capability inspection shared by device discovery and session start.

use evdev::{AbsoluteAxisType, Device, EventType};
use std::collections::BTreeMap;
use std::io;

/// Absolute axes a device must report to speak the type B slot protocol.
pub const REQUIRED_MT_AXES: [AbsoluteAxisType; 4] = [
    AbsoluteAxisType::ABS_MT_SLOT,
    AbsoluteAxisType::ABS_MT_POSITION_X,
    AbsoluteAxisType::ABS_MT_POSITION_Y,
    AbsoluteAxisType::ABS_MT_TRACKING_ID,
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
    pub resolution: i32,
}

impl AxisRange {
    pub fn new(minimum: i32, maximum: i32, resolution: i32) -> Self {
        Self {
            minimum,
            maximum,
            resolution,
        }
    }

    /// Map a device coordinate into `0.0..=1.0`. A degenerate range maps
    /// everything to zero.
    pub fn normalize(&self, value: i32) -> f64 {
        let span = self.maximum as f64 - self.minimum as f64;
        if span <= 0.0 {
            return 0.0;
        }
        ((value as f64 - self.minimum as f64) / span).clamp(0.0, 1.0)
    }
}

/// What a device declared about itself when it was queried.
#[derive(Clone, Debug, Default)]
pub struct DeviceCapabilities {
    pub name: String,
    pub supports_absolute: bool,
    /// Supported absolute axis codes and their ranges.
    pub ranges: BTreeMap<u16, AxisRange>,
}

impl DeviceCapabilities {
    pub fn from_device(device: &Device) -> io::Result<Self> {
        let name = device.name().unwrap_or("unknown").to_string();
        let supports_absolute = device.supported_events().contains(EventType::ABSOLUTE);

        let mut ranges = BTreeMap::new();
        if let Some(axes) = device.supported_absolute_axes() {
            let state = device.get_abs_state()?;
            for axis in axes.iter() {
                let info = &state[axis.0 as usize];
                ranges.insert(
                    axis.0,
                    AxisRange::new(info.minimum, info.maximum, info.resolution),
                );
            }
        }

        Ok(Self {
            name,
            supports_absolute,
            ranges,
        })
    }

    pub fn has_axis(&self, axis: AbsoluteAxisType) -> bool {
        self.ranges.contains_key(&axis.0)
    }

    pub fn range(&self, axis: AbsoluteAxisType) -> Option<AxisRange> {
        self.ranges.get(&axis.0).copied()
    }

    pub fn missing_axes(&self) -> Vec<AbsoluteAxisType> {
        REQUIRED_MT_AXES
            .iter()
            .copied()
            .filter(|axis| !self.has_axis(*axis))
            .collect()
    }

    /// Number of slots the device tracks, derived from the slot axis maximum.
    pub fn num_slots(&self) -> Option<usize> {
        let max = self.range(AbsoluteAxisType::ABS_MT_SLOT)?.maximum;
        if max < 0 {
            None
        } else {
            Some(max as usize + 1)
        }
    }

    pub fn x_range(&self) -> AxisRange {
        self.range(AbsoluteAxisType::ABS_MT_POSITION_X).unwrap_or_default()
    }

    pub fn y_range(&self) -> AxisRange {
        self.range(AbsoluteAxisType::ABS_MT_POSITION_Y).unwrap_or_default()
    }
}

pub fn is_multitouch(caps: &DeviceCapabilities) -> bool {
    caps.supports_absolute && caps.missing_axes().is_empty()
}
