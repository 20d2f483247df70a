use crate::capabilities::AxisRange;

/// Tracking ID the kernel reports for a slot that holds no contact.
pub const TRACKING_ID_NONE: i32 = -1;

/// Snapshot of one contact at the moment an event was emitted.
///
/// `id` is the kernel tracking ID and stays stable for the lifetime of the
/// physical contact; use it to correlate points across poll cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TouchPoint {
    pub id: i32,
    pub pos: (i32, i32),
}

impl TouchPoint {
    pub fn new(id: i32, x: i32, y: i32) -> Self {
        Self { id, pos: (x, y) }
    }

    pub fn x(&self) -> i32 {
        self.pos.0
    }

    pub fn y(&self) -> i32 {
        self.pos.1
    }

    /// Position scaled into `0.0..=1.0` on both axes.
    pub fn normalized(&self, x_range: &AxisRange, y_range: &AxisRange) -> (f64, f64) {
        (x_range.normalize(self.pos.0), y_range.normalize(self.pos.1))
    }
}

/// Receives classified touch events in emission order.
///
/// Within one synchronization batch every `on_finished` arrives before any
/// `on_new` or `on_updated`, so a reused slot or an ID that changed slots
/// is always finished before it starts again. Each kind arrives in
/// ascending slot order.
pub trait TouchSink {
    fn on_new(&mut self, touch: TouchPoint);
    fn on_updated(&mut self, touch: TouchPoint);
    fn on_finished(&mut self, touch: TouchPoint);
}

/// Touch events collected over one poll cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TouchEvents {
    pub new: Vec<TouchPoint>,
    pub updated: Vec<TouchPoint>,
    pub finished: Vec<TouchPoint>,
}

impl TouchEvents {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty() && self.finished.is_empty()
    }

    pub fn len(&self) -> usize {
        self.new.len() + self.updated.len() + self.finished.len()
    }

    pub fn into_parts(self) -> (Vec<TouchPoint>, Vec<TouchPoint>, Vec<TouchPoint>) {
        (self.new, self.updated, self.finished)
    }
}

impl TouchSink for TouchEvents {
    fn on_new(&mut self, touch: TouchPoint) {
        self.new.push(touch);
    }

    fn on_updated(&mut self, touch: TouchPoint) {
        self.updated.push(touch);
    }

    fn on_finished(&mut self, touch: TouchPoint) {
        self.finished.push(touch);
    }
}
