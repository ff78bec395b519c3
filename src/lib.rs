//! # pcm-sink
//!
//! Buffered PCM audio-output sink for a playback pipeline.
//!
//! **Purpose:** Accept a continuous stream of PCM frames from an upstream
//! playback engine, hand them to a device-backed output buffer, and expose
//! the timing, flow-control, and transport primitives (pause, flush/seek,
//! drain) the pipeline needs to stay synchronized with real-time hardware
//! output.
//!
//! **Architecture:** One producer thread drives [`AudioSink`]; the backend
//! (any [`backend::OutputBackend`], by default [`backend::CpalBackend`] over
//! cpal + ringbuf) drains the buffer asynchronously at hardware pace. The
//! synchronization core lives in [`engine::OutputEngine`]: a single mutex,
//! a single condition variable, and bounded 50 ms polling for the two
//! blocking operations.

pub mod backend;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod format;
pub mod sink;
pub mod volume;

pub use backend::{CpalBackend, OutputBackend};
pub use config::SinkConfig;
pub use engine::OutputEngine;
pub use error::{Error, Result};
pub use format::{FormatTag, StreamFormat};
pub use sink::AudioSink;
pub use volume::StereoVolume;
