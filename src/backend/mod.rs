//! Audio-output backend abstraction
//!
//! The engine treats the device side as an opaque concurrent actor behind
//! this trait: a byte-oriented output buffer that the backend drains at
//! hardware pace on its own execution context. Everything the flow-control
//! core needs from a device is expressed here, which also makes the timing
//! behavior testable against a fake backend without real hardware.

pub mod cpal;

pub use self::cpal::CpalBackend;

use crate::error::Result;
use crate::format::StreamFormat;

/// Capability surface the sink requires of any audio-output backend.
///
/// One stream at a time: `open_stream` allocates the device stream and its
/// buffer, `close_stream` releases both. Between those calls the backend
/// drains submitted bytes asynchronously; all other methods observe or steer
/// that drain. Implementations are always called under the engine's lock, so
/// they need no internal synchronization beyond what their device API
/// demands.
pub trait OutputBackend {
    /// Probe whether the default output device supports this stream format.
    ///
    /// Single synchronous query; no fallback negotiation.
    fn supports_format(&self, format: &StreamFormat) -> bool;

    /// Allocate an output stream with exactly `capacity_bytes` of buffer
    /// and start draining it.
    ///
    /// On error no device resources remain allocated.
    fn open_stream(&mut self, format: &StreamFormat, capacity_bytes: usize) -> Result<()>;

    /// Stop and release the open stream. No-op when no stream is open.
    fn close_stream(&mut self);

    /// Bytes of buffer capacity currently free (already drained by the
    /// device and ready to accept more). Non-blocking snapshot.
    fn bytes_free(&self) -> usize;

    /// Total configured buffer capacity in bytes.
    fn capacity_bytes(&self) -> usize;

    /// Accept a byte buffer for playback.
    ///
    /// Synchronous hand-off; the caller has already confirmed space is
    /// available, so the backend accepts the full request.
    fn submit(&mut self, data: &[u8]) -> Result<()>;

    /// Suspend playback without discarding buffered audio.
    fn suspend(&mut self);

    /// Resume playback after a suspend.
    fn resume(&mut self);

    /// Discard all buffered-but-unplayed audio and restart the stream.
    fn reset_and_restart(&mut self) -> Result<()>;

    /// Set the linear output gain (0.0 = silent, 1.0 = unity).
    fn set_gain(&mut self, gain: f32);
}
