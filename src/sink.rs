//! Audio sink lifecycle controller
//!
//! Ties the pieces together for the playback pipeline: resolves the host's
//! format tag, probes the backend, derives the buffer capacity from
//! configuration, opens the engine stream, and applies the current volume.
//! Per-chunk operations are delegated straight to the engine.

use crate::backend::OutputBackend;
use crate::config::SinkConfig;
use crate::engine::OutputEngine;
use crate::error::{Error, Result};
use crate::format::{self, FormatTag, StreamFormat};
use crate::volume::{gain_factor, StereoVolume};
use std::sync::Mutex;
use tracing::{debug, info};

/// Derive the backend buffer capacity in bytes from the configured buffer
/// depth in milliseconds.
///
/// `frame_bytes * (buffer_ms * rate / 1000)`: 16-bit stereo at
/// 44100 Hz with a 500 ms buffer is 88200 bytes.
pub fn buffer_capacity_bytes(format: &StreamFormat, buffer_ms: u32) -> usize {
    format.frame_bytes() * (buffer_ms as u64 * format.sample_rate as u64 / 1000) as usize
}

/// The audio-output sink handed to the playback pipeline.
///
/// Supports exactly one open output stream at a time; a second `open`
/// without an intervening `close` fails with [`Error::InvalidState`].
pub struct AudioSink<B: OutputBackend> {
    engine: OutputEngine<B>,
    config: SinkConfig,
    volume: Mutex<StereoVolume>,
}

impl<B: OutputBackend> AudioSink<B> {
    /// Create a sink with the persisted default volume (100/100).
    pub fn new(backend: B, config: SinkConfig) -> Self {
        Self::with_volume(backend, config, StereoVolume::FULL)
    }

    /// Create a sink with a previously persisted volume.
    pub fn with_volume(backend: B, config: SinkConfig, volume: StereoVolume) -> Self {
        let poll_interval = config.poll_interval();
        Self {
            engine: OutputEngine::new(backend, poll_interval),
            config,
            volume: Mutex::new(volume),
        }
    }

    /// Open an output stream for the given host format tag.
    ///
    /// Resolves the tag, probes the backend for hardware support, allocates
    /// the device stream with the derived buffer capacity, and applies the
    /// current volume gain.
    ///
    /// # Errors
    /// - [`Error::UnsupportedFormat`] if the tag is not in the resolver table
    /// - [`Error::DeviceFormatRejected`] if the hardware declines the format
    /// - [`Error::InvalidState`] if a stream is already open
    ///
    /// On failure no backend resources remain allocated.
    pub fn open(&self, tag: FormatTag, sample_rate: u32, channels: u16) -> Result<()> {
        let format = format::resolve(tag, sample_rate, channels)?;

        debug!(
            "Opening audio for {} channels, {} Hz ({:?})",
            channels, sample_rate, tag
        );

        if !self.engine.supports_format(&format) {
            return Err(Error::DeviceFormatRejected(format!(
                "{:?} at {} Hz, {} channels",
                tag, sample_rate, channels
            )));
        }

        let capacity_bytes = buffer_capacity_bytes(&format, self.config.buffer_ms);
        self.engine.open_stream(&format, capacity_bytes)?;

        let volume = *self.volume.lock().unwrap();
        self.engine.set_gain(gain_factor(volume));

        Ok(())
    }

    /// Stop and release the output stream.
    ///
    /// Wakes any thread blocked in `wait_for_space`/`drain`. Safe to call
    /// when already closed.
    pub fn close(&self) {
        self.engine.close_stream();
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    /// Current stereo volume percentages.
    pub fn volume(&self) -> StereoVolume {
        *self.volume.lock().unwrap()
    }

    /// Record a new stereo volume and, if a stream is open, apply the
    /// derived gain to the backend.
    ///
    /// Persistence is the host's concern; see [`crate::db::settings`].
    pub fn set_volume(&self, volume: StereoVolume) {
        *self.volume.lock().unwrap() = volume;

        if self.engine.is_open() {
            let factor = gain_factor(volume);
            self.engine.set_gain(factor);
            info!(
                "Volume set to {}/{} (gain {:.4})",
                volume.left, volume.right, factor
            );
        }
    }

    /// Bytes of backend buffer currently free. See
    /// [`OutputEngine::free_space`].
    pub fn free_space(&self) -> usize {
        self.engine.free_space()
    }

    /// Block until the backend reports nonzero free space. See
    /// [`OutputEngine::wait_for_space`].
    pub fn wait_for_space(&self) {
        self.engine.wait_for_space()
    }

    /// Hand a byte buffer to the backend. See [`OutputEngine::write`].
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.engine.write(data)
    }

    /// Block until everything buffered has been physically emitted. See
    /// [`OutputEngine::drain`].
    pub fn drain(&self) {
        self.engine.drain()
    }

    /// Elapsed playback time in milliseconds. See
    /// [`OutputEngine::output_time`].
    pub fn output_time(&self) -> i64 {
        self.engine.output_time()
    }

    /// Suspend or resume playback. See [`OutputEngine::pause`].
    pub fn pause(&self, pause: bool) {
        self.engine.pause(pause)
    }

    /// Discard buffered audio and seek the logical position. See
    /// [`OutputEngine::flush`].
    pub fn flush(&self, target_ms: u64) -> Result<()> {
        self.engine.flush(target_ms)
    }
}
