//! Per-contact history, keyed by tracking ID.

use crate::touch::{TouchPoint, TouchSink};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime};

/// Finished tracks kept around for lookup after their contact lifted.
pub const DEFAULT_FINISHED_TRACKS: usize = 32;

/// Everything seen of one physical contact, from touch down to lift.
///
/// Times are the kernel timestamps of the reports that carried each
/// position.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchTrack {
    id: i32,
    start_time: SystemTime,
    end_time: Option<SystemTime>,
    timestamps: Vec<SystemTime>,
    x_positions: Vec<i32>,
    y_positions: Vec<i32>,
}

impl TouchTrack {
    pub fn new(touch: TouchPoint, at: SystemTime) -> Self {
        Self {
            id: touch.id,
            start_time: at,
            end_time: None,
            timestamps: vec![at],
            x_positions: vec![touch.x()],
            y_positions: vec![touch.y()],
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn active(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn push(&mut self, touch: TouchPoint, at: SystemTime) {
        self.timestamps.push(at);
        self.x_positions.push(touch.x());
        self.y_positions.push(touch.y());
    }

    pub fn finish(&mut self, at: SystemTime) {
        self.end_time = Some(at);
    }

    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    pub fn update_time(&self) -> SystemTime {
        self.timestamps.last().copied().unwrap_or(self.start_time)
    }

    pub fn end_time(&self) -> Option<SystemTime> {
        self.end_time
    }

    /// Time from touch down to lift, or to the latest update while the
    /// contact is still down.
    pub fn duration(&self) -> Duration {
        let until = self.end_time.unwrap_or_else(|| self.update_time());
        until.duration_since(self.start_time).unwrap_or_default()
    }

    pub fn start_pos(&self) -> (i32, i32) {
        (self.x_positions[0], self.y_positions[0])
    }

    pub fn pos(&self) -> (i32, i32) {
        let last = self.x_positions.len() - 1;
        (self.x_positions[last], self.y_positions[last])
    }

    /// Current position minus start position.
    pub fn direction(&self) -> (i32, i32) {
        let (sx, sy) = self.start_pos();
        let (x, y) = self.pos();
        (x - sx, y - sy)
    }

    pub fn timestamps(&self) -> &[SystemTime] {
        &self.timestamps
    }

    pub fn x_positions(&self) -> &[i32] {
        &self.x_positions
    }

    pub fn y_positions(&self) -> &[i32] {
        &self.y_positions
    }
}

/// Live tracks plus a bounded tail of finished ones.
#[derive(Clone, Debug)]
pub struct TrackBook {
    live: HashMap<i32, TouchTrack>,
    finished: VecDeque<TouchTrack>,
    keep_finished: usize,
}

impl Default for TrackBook {
    fn default() -> Self {
        Self::new(DEFAULT_FINISHED_TRACKS)
    }
}

impl TrackBook {
    pub fn new(keep_finished: usize) -> Self {
        Self {
            live: HashMap::new(),
            finished: VecDeque::with_capacity(keep_finished),
            keep_finished,
        }
    }

    /// Live track for `id`, or the most recently finished one.
    pub fn get(&self, id: i32) -> Option<&TouchTrack> {
        self.live
            .get(&id)
            .or_else(|| self.finished.iter().rev().find(|t| t.id == id))
    }

    pub fn live(&self) -> impl Iterator<Item = &TouchTrack> + '_ {
        self.live.values()
    }

    pub fn finished(&self) -> impl Iterator<Item = &TouchTrack> + '_ {
        self.finished.iter()
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.finished.clear();
    }

    pub fn start(&mut self, touch: TouchPoint, at: SystemTime) {
        self.live.insert(touch.id, TouchTrack::new(touch, at));
    }

    pub fn update(&mut self, touch: TouchPoint, at: SystemTime) {
        match self.live.get_mut(&touch.id) {
            Some(track) => track.push(touch, at),
            // contact was already down before tracking began
            None => self.start(touch, at),
        }
    }

    pub fn finish(&mut self, touch: TouchPoint, at: SystemTime) {
        let Some(mut track) = self.live.remove(&touch.id) else {
            return;
        };
        if track.pos() != touch.pos {
            track.push(touch, at);
        }
        track.finish(at);

        if self.keep_finished == 0 {
            return;
        }
        if self.finished.len() == self.keep_finished {
            self.finished.pop_front();
        }
        self.finished.push_back(track);
    }

    /// Sink that records into this book at `at` and forwards to `inner`.
    pub fn recorder<'a, S: TouchSink + ?Sized>(
        &'a mut self,
        at: SystemTime,
        inner: &'a mut S,
    ) -> Recorder<'a, S> {
        Recorder {
            book: self,
            at,
            inner,
        }
    }
}

pub struct Recorder<'a, S: TouchSink + ?Sized> {
    book: &'a mut TrackBook,
    at: SystemTime,
    inner: &'a mut S,
}

impl<S: TouchSink + ?Sized> TouchSink for Recorder<'_, S> {
    fn on_new(&mut self, touch: TouchPoint) {
        self.book.start(touch, self.at);
        self.inner.on_new(touch);
    }

    fn on_updated(&mut self, touch: TouchPoint) {
        self.book.update(touch, self.at);
        self.inner.on_updated(touch);
    }

    fn on_finished(&mut self, touch: TouchPoint) {
        self.book.finish(touch, self.at);
        self.inner.on_finished(touch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::TouchEvents;
    use std::time::UNIX_EPOCH;

    fn at(ms: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(ms)
    }

    #[test]
    fn track_follows_contact_lifecycle() {
        let mut book = TrackBook::default();
        book.start(TouchPoint::new(5, 10, 20), at(100));
        book.update(TouchPoint::new(5, 14, 17), at(110));
        book.update(TouchPoint::new(5, 18, 12), at(125));

        let track = book.get(5).unwrap();
        assert!(track.active());
        assert_eq!(track.start_pos(), (10, 20));
        assert_eq!(track.pos(), (18, 12));
        assert_eq!(track.direction(), (8, -8));
        assert_eq!(track.x_positions(), &[10, 14, 18]);
        assert_eq!(track.y_positions(), &[20, 17, 12]);
        assert_eq!(track.timestamps(), &[at(100), at(110), at(125)]);
        assert_eq!(track.update_time(), at(125));
        assert_eq!(track.duration(), Duration::from_millis(25));

        book.finish(TouchPoint::new(5, 18, 12), at(140));
        let track = book.get(5).unwrap();
        assert!(!track.active());
        assert_eq!(track.end_time(), Some(at(140)));
        assert_eq!(track.duration(), Duration::from_millis(40));
        // lift at the last known position adds no sample
        assert_eq!(track.x_positions().len(), 3);
        assert_eq!(book.live().count(), 0);
    }

    #[test]
    fn finished_tracks_are_bounded() {
        let mut book = TrackBook::new(2);
        for id in 0..3 {
            book.start(TouchPoint::new(id, 0, 0), at(0));
            book.finish(TouchPoint::new(id, 0, 0), at(1));
        }
        assert!(book.get(0).is_none());
        assert!(book.get(1).is_some());
        assert!(book.get(2).is_some());
        assert_eq!(book.finished().count(), 2);
    }

    #[test]
    fn update_without_start_opens_track() {
        let mut book = TrackBook::default();
        book.update(TouchPoint::new(3, 1, 2), at(7));
        assert_eq!(book.get(3).map(|t| t.start_time()), Some(at(7)));
    }

    #[test]
    fn recorder_forwards_and_records() {
        let mut book = TrackBook::default();
        let mut events = TouchEvents::default();
        {
            let mut recorder = book.recorder(at(50), &mut events);
            recorder.on_new(TouchPoint::new(1, 4, 4));
        }
        assert_eq!(events.new, vec![TouchPoint::new(1, 4, 4)]);
        assert_eq!(book.get(1).map(|t| t.start_time()), Some(at(50)));
    }
}
