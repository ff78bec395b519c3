//! Buffered output engine
//!
//! The synchronization core shared between the playback thread (producer)
//! and the device backend (asynchronous consumer). One mutex guards the
//! backend plus the per-stream counters; one condition variable signals
//! "free space may have changed".
//!
//! ```text
//! playback thread ──▶ write() ──▶ OutputEngine ──▶ OutputBackend ──▶ hardware
//!                     wait_for_space() / drain()        │
//!                     output_time() / pause() / flush() │ drains
//!                                   ▲                   │ asynchronously
//!                                   └── Condvar ◀───────┘
//! ```
//!
//! ## Blocking model
//!
//! `wait_for_space` and `drain` are the only operations that block, and both
//! use bounded-interval waits: the condition variable is re-checked at least
//! every poll interval (default 50 ms) even without a signal, because the
//! backend drains on its own execution context and cannot raise the condvar
//! itself. A pure indefinite wait would be vulnerable to missed wakeups from
//! that side. `pause`, `flush`, and `close_stream` broadcast the condvar so
//! blocked threads re-evaluate immediately instead of sleeping out the rest
//! of their poll interval.
//!
//! ## Invariants
//!
//! - `frames_written` only increases, except `flush` which reassigns it to a
//!   seek-derived target. The reassignment and the backend reset happen under
//!   one lock acquisition, so `output_time` never observes one without the
//!   other.
//! - `capacity_bytes` is fixed for the lifetime of one open stream.

use crate::backend::OutputBackend;
use crate::error::{Error, Result};
use crate::format::StreamFormat;
use std::sync::{Condvar, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// The buffered-output synchronization engine.
///
/// Owns the backend and the stream state; all operations are serialized by
/// the internal mutex. One open stream at a time.
pub struct OutputEngine<B: OutputBackend> {
    /// Shared state: backend handle plus optional open-stream counters
    state: Mutex<EngineState<B>>,

    /// Signals that free space may have changed (pause/flush/close)
    space_changed: Condvar,

    /// Ceiling on each bounded wait in `wait_for_space`/`drain`
    poll_interval: Duration,
}

/// Everything guarded by the engine mutex
struct EngineState<B> {
    backend: B,
    stream: Option<StreamState>,
}

/// Per-stream counters, created on open and discarded on close
#[derive(Debug, Clone, Copy)]
struct StreamState {
    /// Sample rate in Hz, fixed at open
    sample_rate: u32,

    /// Bytes per logical frame (bytes per sample × channels), fixed at open
    frame_bytes: usize,

    /// Backend buffer capacity in bytes, fixed at open
    capacity_bytes: usize,

    /// Logical frames handed to the backend since open or the last flush
    frames_written: i64,

    /// Whether playback is currently suspended
    paused: bool,
}

impl<B: OutputBackend> OutputEngine<B> {
    /// Create an engine around a backend. No stream is open yet.
    pub fn new(backend: B, poll_interval: Duration) -> Self {
        Self {
            state: Mutex::new(EngineState {
                backend,
                stream: None,
            }),
            space_changed: Condvar::new(),
            poll_interval,
        }
    }

    /// Probe the backend for hardware support of a stream format.
    pub fn supports_format(&self, format: &StreamFormat) -> bool {
        self.state.lock().unwrap().backend.supports_format(format)
    }

    /// Allocate a backend stream with exactly `capacity_bytes` of buffer and
    /// reset the frame counter.
    ///
    /// # Errors
    /// - [`Error::InvalidState`] if a stream is already open
    /// - Backend errors from stream allocation, in which case no engine or
    ///   backend state is retained
    pub fn open_stream(&self, format: &StreamFormat, capacity_bytes: usize) -> Result<()> {
        let mut guard = self.state.lock().unwrap();

        if guard.stream.is_some() {
            return Err(Error::InvalidState(
                "a stream is already open; close it first".to_string(),
            ));
        }

        guard.backend.open_stream(format, capacity_bytes)?;

        guard.stream = Some(StreamState {
            sample_rate: format.sample_rate,
            frame_bytes: format.frame_bytes(),
            capacity_bytes,
            frames_written: 0,
            paused: false,
        });

        info!(
            "Output stream open: {} Hz, {} channels, {} byte buffer",
            format.sample_rate, format.channels, capacity_bytes
        );
        Ok(())
    }

    /// Stop and release the backend stream.
    ///
    /// Broadcasts the internal signal so threads blocked in
    /// `wait_for_space`/`drain` observe the closed stream and return. No-op
    /// when no stream is open.
    pub fn close_stream(&self) {
        let mut guard = self.state.lock().unwrap();

        if guard.stream.take().is_some() {
            guard.backend.close_stream();
            info!("Output stream closed");
        } else {
            debug!("close_stream called with no open stream");
        }

        self.space_changed.notify_all();
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().stream.is_some()
    }

    /// Bytes of backend buffer currently free.
    ///
    /// Non-blocking snapshot; stale as soon as the lock is released, since
    /// the backend drains asynchronously. Returns 0 when no stream is open.
    pub fn free_space(&self) -> usize {
        let guard = self.state.lock().unwrap();
        match guard.stream {
            Some(_) => guard.backend.bytes_free(),
            None => 0,
        }
    }

    /// Block until the backend reports nonzero free space.
    ///
    /// Re-checks under the lock at least every poll interval, or immediately
    /// when `pause`/`flush`/`close_stream` signal. Returns immediately if the
    /// stream is closed (or closes while waiting). Total wait time is
    /// unbounded otherwise; it tracks the hardware drain rate.
    pub fn wait_for_space(&self) {
        let mut guard = self.state.lock().unwrap();

        loop {
            if guard.stream.is_none() || guard.backend.bytes_free() > 0 {
                return;
            }

            let (next, _timeout) = self
                .space_changed
                .wait_timeout(guard, self.poll_interval)
                .unwrap();
            guard = next;
        }
    }

    /// Hand a byte buffer to the backend and advance the frame counter.
    ///
    /// The caller must already have confirmed room via
    /// [`free_space`](Self::free_space)/[`wait_for_space`](Self::wait_for_space);
    /// the engine does not block here.
    ///
    /// # Errors
    /// - [`Error::InvalidState`] if no stream is open
    /// - Backend errors from the hand-off
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let EngineState { backend, stream } = &mut *guard;

        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("write with no open stream".to_string()))?;

        backend.submit(data)?;
        stream.frames_written += (data.len() / stream.frame_bytes) as i64;

        Ok(())
    }

    /// Block until the backend has physically emitted everything buffered,
    /// i.e. until free space equals the configured capacity.
    ///
    /// Same bounded polling as [`wait_for_space`](Self::wait_for_space);
    /// returns immediately if the stream is closed (or closes while waiting).
    pub fn drain(&self) {
        debug!("Draining output buffer");
        let mut guard = self.state.lock().unwrap();

        loop {
            let Some(stream) = guard.stream else {
                return;
            };
            if guard.backend.bytes_free() >= stream.capacity_bytes {
                return;
            }

            let (next, _timeout) = self
                .space_changed
                .wait_timeout(guard, self.poll_interval)
                .unwrap();
            guard = next;
        }
    }

    /// Elapsed playback time in milliseconds.
    ///
    /// Logical frames written minus the frames still sitting unplayed in the
    /// backend buffer, converted to wall-clock time at the stream's sample
    /// rate. Returns 0 when no stream is open.
    pub fn output_time(&self) -> i64 {
        let guard = self.state.lock().unwrap();

        match guard.stream {
            Some(stream) => {
                let buffered_bytes = stream
                    .capacity_bytes
                    .saturating_sub(guard.backend.bytes_free());
                let buffered_frames = (buffered_bytes / stream.frame_bytes) as i64;

                (stream.frames_written - buffered_frames) * 1000 / stream.sample_rate as i64
            }
            None => 0,
        }
    }

    /// Suspend or resume backend playback.
    ///
    /// Broadcasts the internal signal afterward so any thread blocked in
    /// `wait_for_space`/`drain` re-evaluates immediately.
    pub fn pause(&self, pause: bool) {
        let mut guard = self.state.lock().unwrap();
        let EngineState { backend, stream } = &mut *guard;

        if let Some(stream) = stream.as_mut() {
            if pause {
                backend.suspend();
            } else {
                backend.resume();
            }
            stream.paused = pause;
            debug!("{}", if pause { "Paused" } else { "Resumed" });
        }

        self.space_changed.notify_all();
    }

    /// Discard all buffered-but-unplayed audio and reassign the logical
    /// position to `target_ms` (used on seek).
    ///
    /// The frame counter reassignment and the backend reset happen under one
    /// lock acquisition, so a racing `output_time` never observes an
    /// inconsistent pair. Broadcasts the internal signal afterward.
    ///
    /// # Errors
    /// - [`Error::InvalidState`] if no stream is open
    /// - Backend errors from the reset/restart
    pub fn flush(&self, target_ms: u64) -> Result<()> {
        debug!("Flush requested; discarding buffer, seeking to {} ms", target_ms);
        let mut guard = self.state.lock().unwrap();
        let EngineState { backend, stream } = &mut *guard;

        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("flush with no open stream".to_string()))?;

        stream.frames_written = (target_ms * stream.sample_rate as u64 / 1000) as i64;
        backend.reset_and_restart()?;

        self.space_changed.notify_all();
        Ok(())
    }

    /// Set the backend's linear output gain.
    pub fn set_gain(&self, gain: f32) {
        self.state.lock().unwrap().backend.set_gain(gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{resolve, FormatTag};

    /// Minimal in-module fake: tracks a byte count, never drains on its own.
    /// The fuller shared mock with consumption knobs lives in tests/helpers.
    struct FakeBackend {
        capacity: usize,
        used: usize,
        open: bool,
        gain: f32,
        suspended: bool,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                capacity: 0,
                used: 0,
                open: false,
                gain: 1.0,
                suspended: false,
            }
        }
    }

    impl OutputBackend for FakeBackend {
        fn supports_format(&self, _format: &StreamFormat) -> bool {
            true
        }

        fn open_stream(&mut self, _format: &StreamFormat, capacity_bytes: usize) -> Result<()> {
            self.capacity = capacity_bytes;
            self.used = 0;
            self.open = true;
            Ok(())
        }

        fn close_stream(&mut self) {
            self.open = false;
        }

        fn bytes_free(&self) -> usize {
            self.capacity - self.used
        }

        fn capacity_bytes(&self) -> usize {
            self.capacity
        }

        fn submit(&mut self, data: &[u8]) -> Result<()> {
            self.used += data.len();
            Ok(())
        }

        fn suspend(&mut self) {
            self.suspended = true;
        }

        fn resume(&mut self) {
            self.suspended = false;
        }

        fn reset_and_restart(&mut self) -> Result<()> {
            self.used = 0;
            Ok(())
        }

        fn set_gain(&mut self, gain: f32) {
            self.gain = gain;
        }
    }

    fn open_engine() -> OutputEngine<FakeBackend> {
        let engine = OutputEngine::new(FakeBackend::new(), Duration::from_millis(50));
        let format = resolve(FormatTag::S16Le, 44100, 2).unwrap();
        engine.open_stream(&format, 88200).unwrap();
        engine
    }

    #[test]
    fn test_output_time_zero_after_open() {
        let engine = open_engine();
        assert_eq!(engine.output_time(), 0);
    }

    #[test]
    fn test_output_time_counts_buffered_frames() {
        let engine = open_engine();

        // 4410 frames of 16-bit stereo, all still sitting in the buffer
        engine.write(&vec![0u8; 4410 * 4]).unwrap();
        assert_eq!(engine.output_time(), 0);
        assert_eq!(engine.free_space(), 88200 - 4410 * 4);
    }

    #[test]
    fn test_double_open_rejected() {
        let engine = open_engine();
        let format = resolve(FormatTag::S16Le, 44100, 2).unwrap();

        let result = engine.open_stream(&format, 88200);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_flush_reassigns_position() {
        let engine = open_engine();
        engine.write(&vec![0u8; 8820]).unwrap();

        engine.flush(30_000).unwrap();

        // Backend reset discards buffered audio; position now reflects the
        // seek target exactly.
        assert_eq!(engine.free_space(), 88200);
        assert_eq!(engine.output_time(), 30_000);
    }

    #[test]
    fn test_write_after_close_rejected() {
        let engine = open_engine();
        engine.close_stream();

        assert!(matches!(
            engine.write(&[0u8; 4]),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(engine.flush(0), Err(Error::InvalidState(_))));
        assert_eq!(engine.output_time(), 0);
        assert_eq!(engine.free_space(), 0);
    }

    #[test]
    fn test_close_idempotent() {
        let engine = open_engine();
        engine.close_stream();
        engine.close_stream();
        assert!(!engine.is_open());
    }
}
