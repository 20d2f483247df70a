use crate::capabilities::{AxisRange, DeviceCapabilities, REQUIRED_MT_AXES};
use crate::error::SourceError;
use crate::source::EventSource;
use evdev::{AbsoluteAxisType, EventType, InputEvent, Key, Synchronization};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn abs(axis: AbsoluteAxisType, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE, axis.0, value)
}

pub fn key(key: Key, value: i32) -> InputEvent {
    InputEvent::new(EventType::KEY, key.code(), value)
}

pub fn syn() -> InputEvent {
    InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
}

/// Report stamped `ms` milliseconds after the epoch.
pub fn syn_at(ms: u64) -> InputEvent {
    InputEvent::from(libc::input_event {
        time: libc::timeval {
            tv_sec: (ms / 1000) as _,
            tv_usec: ((ms % 1000) * 1000) as _,
        },
        type_: EventType::SYNCHRONIZATION.0,
        code: Synchronization::SYN_REPORT.0,
        value: 0,
    })
}

pub fn syn_dropped() -> InputEvent {
    InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_DROPPED.0, 0)
}

pub fn touchscreen_caps(num_slots: i32) -> DeviceCapabilities {
    let mut caps = DeviceCapabilities {
        name: "Scripted Touchscreen".to_string(),
        supports_absolute: true,
        ..Default::default()
    };
    for axis in REQUIRED_MT_AXES {
        let range = match axis {
            AbsoluteAxisType::ABS_MT_SLOT => AxisRange::new(0, num_slots - 1, 0),
            AbsoluteAxisType::ABS_MT_TRACKING_ID => AxisRange::new(0, 65535, 0),
            _ => AxisRange::new(0, 4095, 0),
        };
        caps.ranges.insert(axis.0, range);
    }
    caps
}

/// Hands out one prepared batch of records per fetch, then an optional
/// failure, then nothing.
pub struct ScriptedSource {
    caps: DeviceCapabilities,
    batches: VecDeque<Vec<InputEvent>>,
    failure: Option<SourceError>,
    grabbed: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(caps: DeviceCapabilities, batches: Vec<Vec<InputEvent>>) -> Self {
        Self {
            caps,
            batches: batches.into(),
            failure: None,
            grabbed: Arc::new(AtomicBool::new(false)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_with(&mut self, err: SourceError) {
        self.failure = Some(err);
    }

    pub fn grabbed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.grabbed)
    }

    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl EventSource for ScriptedSource {
    fn capabilities(&self) -> Result<DeviceCapabilities, SourceError> {
        Ok(self.caps.clone())
    }

    fn fetch(
        &mut self,
        _timeout: Option<Duration>,
        out: &mut Vec<InputEvent>,
    ) -> Result<(), SourceError> {
        if let Some(batch) = self.batches.pop_front() {
            out.extend(batch);
            return Ok(());
        }
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn grab(&mut self) -> Result<(), SourceError> {
        self.grabbed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn ungrab(&mut self) -> Result<(), SourceError> {
        self.grabbed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
