//! Device session: owns the source, the slot table and the reconciler for
//! one device, and turns each poll into a batch of touch events.

use crate::capabilities::{is_multitouch, DeviceCapabilities};
use crate::decoder::{Decoded, ProtocolDecoder};
use crate::error::{DecodeError, SessionError, SourceError};
use crate::reconcile::Reconciler;
use crate::source::{EventSource, EvdevSource};
use crate::touch::{TouchEvents, TouchPoint, TouchSink};
use crate::track::{TouchTrack, TrackBook, DEFAULT_FINISHED_TRACKS};
use evdev::InputEvent;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a single poll waits for the device by default. Keeps `stop()`
/// from another part of the caller's loop responsive.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub path: PathBuf,
    /// `None` blocks in `poll()` until the device produces records,
    /// `Some(Duration::ZERO)` makes `poll()` non-blocking.
    pub poll_timeout: Option<Duration>,
    /// Trace every raw record.
    pub verbose: bool,
    /// Take the device exclusively on start.
    pub grab: bool,
    /// How many lifted contacts keep their track available.
    pub finished_tracks: usize,
}

impl SessionConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_timeout: Some(DEFAULT_POLL_TIMEOUT),
            verbose: false,
            grab: false,
            finished_tracks: DEFAULT_FINISHED_TRACKS,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_grab(mut self, grab: bool) -> Self {
        self.grab = grab;
        self
    }

    pub fn with_finished_tracks(mut self, count: usize) -> Self {
        self.finished_tracks = count;
        self
    }
}

/// Why a session is no longer running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    Disconnected,
    ReadFailed,
    Corrupted,
}

type Opener<S> = Box<dyn FnMut(&Path) -> Result<S, SourceError> + Send>;

/// A single multitouch device being polled for touch lifecycle events.
///
/// There is one reader and one mutator: `poll()` is the only place state
/// changes, and it is the only call that may block. `stop()` takes effect
/// at the next `poll()` boundary; a blocked read is bounded by
/// [`SessionConfig::poll_timeout`], not interrupted.
pub struct DeviceSession<S: EventSource = EvdevSource> {
    config: SessionConfig,
    opener: Opener<S>,
    source: Option<S>,
    capabilities: Option<DeviceCapabilities>,
    decoder: ProtocolDecoder,
    reconciler: Reconciler,
    tracks: TrackBook,
    buffer: Vec<InputEvent>,
    running: bool,
    stop_reason: Option<StopReason>,
}

impl DeviceSession<EvdevSource> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_opener(config, EvdevSource::open)
    }
}

impl<S: EventSource> DeviceSession<S> {
    /// Session over any [`EventSource`]; `opener` is called by `start()`
    /// with the configured path.
    pub fn with_opener<F>(config: SessionConfig, opener: F) -> Self
    where
        F: FnMut(&Path) -> Result<S, SourceError> + Send + 'static,
    {
        Self {
            config,
            opener: Box::new(opener),
            source: None,
            capabilities: None,
            decoder: ProtocolDecoder::new(0),
            reconciler: Reconciler::new(0),
            tracks: TrackBook::default(),
            buffer: Vec::new(),
            running: false,
            stop_reason: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open the device, verify it speaks the slot protocol and size the slot
    /// table from its slot count. Starting a running session does nothing.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.running {
            return Ok(());
        }
        let path = self.config.path.clone();

        let mut source =
            (self.opener)(&path).map_err(|e| SessionError::unavailable(&path, e))?;

        // capabilities may have changed since discovery
        let caps = source
            .capabilities()
            .map_err(|e| SessionError::unavailable(&path, e))?;
        if !is_multitouch(&caps) {
            let missing: Vec<String> = caps
                .missing_axes()
                .iter()
                .map(|axis| format!("{:?}", axis))
                .collect();
            return Err(SessionError::unavailable(
                &path,
                format!(
                    "\"{}\" is not a multitouch device (missing: {})",
                    caps.name,
                    if missing.is_empty() {
                        "absolute events".to_string()
                    } else {
                        missing.join(", ")
                    }
                ),
            ));
        }
        let num_slots = match caps.num_slots() {
            Some(n) if n > 0 => n,
            _ => {
                return Err(SessionError::unavailable(
                    &path,
                    "device reports no slots",
                ))
            }
        };

        if self.config.grab {
            source
                .grab()
                .map_err(|e| SessionError::unavailable(&path, e))?;
        }

        info!(path = %path.display(), name = %caps.name, num_slots, "session started");

        self.decoder = ProtocolDecoder::with_verbose(num_slots, self.config.verbose);
        self.reconciler = Reconciler::new(num_slots);
        self.tracks = TrackBook::new(self.config.finished_tracks);
        self.buffer = Vec::with_capacity(64);
        self.capabilities = Some(caps);
        self.source = Some(source);
        self.running = true;
        self.stop_reason = None;
        Ok(())
    }

    /// Stop polling and release the device. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.shutdown(StopReason::Requested);
    }

    fn shutdown(&mut self, reason: StopReason) {
        if self.source.take().is_some() {
            debug!(path = %self.config.path.display(), ?reason, "device released");
        }
        if self.running {
            self.running = false;
            self.stop_reason = Some(reason);
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Run one read cycle and collect the events of every batch it closed.
    ///
    /// Returns empty events when nothing was synchronized, when the session
    /// is stopped, and when the device went away (check [`running`]). A
    /// corrupt stream stops the session and is returned as an error that
    /// carries the events of the batches completed before it.
    ///
    /// [`running`]: DeviceSession::running
    pub fn poll(&mut self) -> Result<TouchEvents, SessionError> {
        let mut events = TouchEvents::default();
        match self.poll_with(&mut events) {
            Ok(()) => Ok(events),
            Err(SessionError::DecodeCorruption { error, .. }) => {
                Err(SessionError::DecodeCorruption {
                    error,
                    salvaged: events,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`poll`](DeviceSession::poll), but reports events to `sink` as
    /// each batch is reconciled. On corruption, `sink` has already seen the
    /// completed batches and the returned error's `salvaged` is empty.
    pub fn poll_with<T: TouchSink + ?Sized>(&mut self, sink: &mut T) -> Result<(), SessionError> {
        if !self.running {
            return Ok(());
        }
        let mut records = std::mem::take(&mut self.buffer);
        records.clear();

        let timeout = self.config.poll_timeout;
        let fetched = match self.source.as_mut() {
            Some(source) => source.fetch(timeout, &mut records),
            None => {
                self.buffer = records;
                self.shutdown(StopReason::Requested);
                return Ok(());
            }
        };

        if let Err(e) = fetched {
            let reason = match e {
                SourceError::Disconnected(_) => StopReason::Disconnected,
                _ => StopReason::ReadFailed,
            };
            warn!(path = %self.config.path.display(), error = %e, "device read ended session");
            self.buffer = records;
            self.shutdown(reason);
            return Ok(());
        }

        let decoded = self.decode(&records, sink);
        self.buffer = records;

        if let Err(e) = decoded {
            error!(path = %self.config.path.display(), error = %e, "stopping on corrupt stream");
            self.shutdown(StopReason::Corrupted);
            return Err(SessionError::DecodeCorruption {
                error: e,
                salvaged: TouchEvents::default(),
            });
        }
        Ok(())
    }

    fn decode<T: TouchSink + ?Sized>(
        &mut self,
        records: &[InputEvent],
        sink: &mut T,
    ) -> Result<(), DecodeError> {
        for event in records {
            if self.decoder.process(event)? == Decoded::Synced {
                let mut recorder = self.tracks.recorder(event.timestamp(), sink);
                self.reconciler
                    .reconcile(self.decoder.slots_mut(), &mut recorder)?;
            }
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.capabilities.as_ref().map(|c| c.name.as_str())
    }

    pub fn num_slots(&self) -> usize {
        self.decoder.slots().len()
    }

    pub fn capabilities(&self) -> Option<&DeviceCapabilities> {
        self.capabilities.as_ref()
    }

    /// Contacts present as of the last synchronization boundary.
    pub fn touch_points(&self) -> Vec<TouchPoint> {
        self.reconciler.active().collect()
    }

    /// History of the contact with tracking ID `id`: live, or among the most
    /// recently lifted ones. Kept after the session stops.
    pub fn track(&self, id: i32) -> Option<&TouchTrack> {
        self.tracks.get(id)
    }

    pub fn tracks(&self) -> &TrackBook {
        &self.tracks
    }

    /// Readiness descriptor for callers integrating the device into their
    /// own event loop. `None` while stopped.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.source.as_ref().and_then(|s| s.raw_fd())
    }

    pub fn grab(&mut self) -> Result<(), SessionError> {
        match self.source.as_mut() {
            Some(source) => Ok(source.grab()?),
            None => Ok(()),
        }
    }

    pub fn ungrab(&mut self) -> Result<(), SessionError> {
        match self.source.as_mut() {
            Some(source) => Ok(source.ungrab()?),
            None => Ok(()),
        }
    }
}
