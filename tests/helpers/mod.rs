//! Shared test helpers
//!
//! `MockBackend` stands in for the audio device: it implements the full
//! `OutputBackend` contract over a plain byte counter, with test-side knobs
//! to consume buffered bytes (simulating the hardware drain) or to swallow
//! every submit instantly. Cloning shares the underlying state, so a test
//! can hand one clone to the sink and keep another to observe and steer it.

#![allow(dead_code)]

use pcm_sink::backend::OutputBackend;
use pcm_sink::error::{Error, Result};
use pcm_sink::format::StreamFormat;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

struct MockState {
    open: bool,
    supported: bool,
    consume_instantly: bool,
    capacity: usize,
    buffered: usize,
    gain: f32,
    suspended: bool,
    resets: u32,
    submitted: Vec<u8>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                open: false,
                supported: true,
                consume_instantly: false,
                capacity: 0,
                buffered: 0,
                gain: 1.0,
                suspended: false,
                resets: 0,
                submitted: Vec::new(),
            })),
        }
    }

    /// A backend whose device rejects every format probe.
    pub fn rejecting_formats() -> Self {
        let backend = Self::new();
        backend.inner.lock().unwrap().supported = false;
        backend
    }

    /// A backend that drains every submit immediately (free space never
    /// shrinks).
    pub fn instant_consumer() -> Self {
        let backend = Self::new();
        backend.inner.lock().unwrap().consume_instantly = true;
        backend
    }

    /// Simulate the hardware draining `bytes` from the buffer.
    pub fn consume(&self, bytes: usize) {
        let mut state = self.inner.lock().unwrap();
        state.buffered = state.buffered.saturating_sub(bytes);
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }

    pub fn buffered(&self) -> usize {
        self.inner.lock().unwrap().buffered
    }

    pub fn gain(&self) -> f32 {
        self.inner.lock().unwrap().gain
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.lock().unwrap().suspended
    }

    pub fn reset_count(&self) -> u32 {
        self.inner.lock().unwrap().resets
    }

    pub fn submitted(&self) -> Vec<u8> {
        self.inner.lock().unwrap().submitted.clone()
    }
}

impl OutputBackend for MockBackend {
    fn supports_format(&self, _format: &StreamFormat) -> bool {
        self.inner.lock().unwrap().supported
    }

    fn open_stream(&mut self, _format: &StreamFormat, capacity_bytes: usize) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.capacity = capacity_bytes;
        state.buffered = 0;
        state.open = true;
        Ok(())
    }

    fn close_stream(&mut self) {
        self.inner.lock().unwrap().open = false;
    }

    fn bytes_free(&self) -> usize {
        let state = self.inner.lock().unwrap();
        state.capacity - state.buffered
    }

    fn capacity_bytes(&self) -> usize {
        self.inner.lock().unwrap().capacity
    }

    fn submit(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        if !state.open {
            return Err(Error::InvalidState("submit with no open stream".to_string()));
        }

        state.submitted.extend_from_slice(data);
        if !state.consume_instantly {
            state.buffered += data.len();
        }
        Ok(())
    }

    fn suspend(&mut self) {
        self.inner.lock().unwrap().suspended = true;
    }

    fn resume(&mut self) {
        self.inner.lock().unwrap().suspended = false;
    }

    fn reset_and_restart(&mut self) -> Result<()> {
        let mut state = self.inner.lock().unwrap();
        state.buffered = 0;
        state.resets += 1;
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) {
        self.inner.lock().unwrap().gain = gain;
    }
}
