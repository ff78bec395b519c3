//! cpal implementation of the output backend
//!
//! Bridges the byte-oriented backend contract onto cpal's callback model: an
//! open stream owns a lock-free byte ring of exactly the negotiated capacity,
//! `submit` pushes raw sample bytes into it, and the device callback pops
//! bytes, converts them to f32 per the negotiated format, applies the shared
//! gain, and emits silence on underrun. Free space is the ring's vacant
//! length, so the flow-control arithmetic upstream sees exactly what the
//! hardware has and has not consumed.

use crate::backend::OutputBackend;
use crate::error::{Error, Result};
use crate::format::{Endianness, SampleKind, StreamFormat};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::{traits::*, HeapProd, HeapRb};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Audio-output backend over the default cpal output device.
pub struct CpalBackend {
    device: Device,
    /// Linear gain read by the audio callback on every buffer
    gain: Arc<Mutex<f32>>,
    stream: Option<OpenStream>,
}

/// The open device stream and the producer half of its feed ring
struct OpenStream {
    stream: Stream,
    prod: HeapProd<u8>,
    format: StreamFormat,
    capacity_bytes: usize,
}

impl CpalBackend {
    /// Open the default output device.
    ///
    /// # Errors
    /// [`Error::Backend`] if no default output device is available.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Backend("No default output device found".to_string()))?;

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using default audio device: {}", name);

        Ok(Self {
            device,
            gain: Arc::new(Mutex::new(1.0)),
            stream: None,
        })
    }

    /// Build and start a device stream fed by a fresh ring of
    /// `capacity_bytes`.
    fn build_stream(&self, format: &StreamFormat, capacity_bytes: usize) -> Result<OpenStream> {
        let rb = HeapRb::<u8>::new(capacity_bytes);
        let (prod, mut cons) = rb.split();

        let gain = Arc::clone(&self.gain);
        let fmt = *format;
        let bytes_per_sample = fmt.bytes_per_sample();

        let config = StreamConfig {
            channels: fmt.channels,
            sample_rate: cpal::SampleRate(fmt.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        debug!(
            "Building output stream: {} Hz, {} channels, {} byte ring",
            fmt.sample_rate, fmt.channels, capacity_bytes
        );

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let current_gain = *gain.lock().unwrap();
                    let mut raw = [0u8; 4];

                    for out in data.iter_mut() {
                        if cons.pop_slice(&mut raw[..bytes_per_sample]) == bytes_per_sample {
                            let sample = decode_sample(&raw[..bytes_per_sample], fmt.kind, fmt.endian);
                            *out = (sample * current_gain).clamp(-1.0, 1.0);
                        } else {
                            // Underrun: emit silence rather than stale data
                            *out = 0.0;
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::Backend(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Backend(format!("Failed to start stream: {}", e)))?;

        Ok(OpenStream {
            stream,
            prod,
            format: fmt,
            capacity_bytes,
        })
    }
}

impl OutputBackend for CpalBackend {
    fn supports_format(&self, format: &StreamFormat) -> bool {
        let mut configs = match self.device.supported_output_configs() {
            Ok(configs) => configs,
            Err(e) => {
                warn!("Failed to query device configs: {}", e);
                return false;
            }
        };

        // The callback converts every tabled sample layout to f32 in
        // software, so hardware support reduces to an f32 config covering
        // the requested rate and channel count.
        configs.any(|c| {
            c.channels() == format.channels
                && c.min_sample_rate().0 <= format.sample_rate
                && c.max_sample_rate().0 >= format.sample_rate
                && c.sample_format() == SampleFormat::F32
        })
    }

    fn open_stream(&mut self, format: &StreamFormat, capacity_bytes: usize) -> Result<()> {
        self.stream = Some(self.build_stream(format, capacity_bytes)?);
        Ok(())
    }

    fn close_stream(&mut self) {
        if let Some(open) = self.stream.take() {
            if let Err(e) = open.stream.pause() {
                warn!("Failed to pause stream on close: {}", e);
            }
            drop(open);
            info!("Device stream stopped");
        }
    }

    fn bytes_free(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.prod.vacant_len())
    }

    fn capacity_bytes(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.capacity_bytes)
    }

    fn submit(&mut self, data: &[u8]) -> Result<()> {
        let open = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("submit with no open stream".to_string()))?;

        let pushed = open.prod.push_slice(data);
        if pushed < data.len() {
            return Err(Error::Backend(format!(
                "Output buffer overrun: accepted {} of {} bytes",
                pushed,
                data.len()
            )));
        }

        Ok(())
    }

    fn suspend(&mut self) {
        if let Some(open) = &self.stream {
            if let Err(e) = open.stream.pause() {
                warn!("Failed to suspend stream: {}", e);
            }
        }
    }

    fn resume(&mut self) {
        if let Some(open) = &self.stream {
            if let Err(e) = open.stream.play() {
                warn!("Failed to resume stream: {}", e);
            }
        }
    }

    fn reset_and_restart(&mut self) -> Result<()> {
        let open = self
            .stream
            .take()
            .ok_or_else(|| Error::InvalidState("reset with no open stream".to_string()))?;

        let format = open.format;
        let capacity_bytes = open.capacity_bytes;

        // Dropping the old stream discards the ring and everything queued in
        // it; the rebuilt stream starts from an empty buffer.
        drop(open);

        self.stream = Some(self.build_stream(&format, capacity_bytes)?);
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) {
        *self.gain.lock().unwrap() = gain.clamp(0.0, 1.0);
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        self.close_stream();
    }
}

/// Convert one raw sample to f32 in [-1.0, 1.0] per the stream format.
fn decode_sample(raw: &[u8], kind: SampleKind, endian: Endianness) -> f32 {
    match (raw.len(), kind) {
        (2, SampleKind::SignedInt) => {
            let v = match endian {
                Endianness::Little => i16::from_le_bytes([raw[0], raw[1]]),
                Endianness::Big => i16::from_be_bytes([raw[0], raw[1]]),
            };
            v as f32 / 32768.0
        }
        (2, SampleKind::UnsignedInt) => {
            let v = match endian {
                Endianness::Little => u16::from_le_bytes([raw[0], raw[1]]),
                Endianness::Big => u16::from_be_bytes([raw[0], raw[1]]),
            };
            (v as f32 - 32768.0) / 32768.0
        }
        (4, SampleKind::SignedInt) => {
            let v = match endian {
                Endianness::Little => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
                Endianness::Big => i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            };
            (v as f64 / 2147483648.0) as f32
        }
        (4, SampleKind::UnsignedInt) => {
            let v = match endian {
                Endianness::Little => u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
                Endianness::Big => u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            };
            ((v as f64 - 2147483648.0) / 2147483648.0) as f32
        }
        (4, SampleKind::Float) => match endian {
            Endianness::Little => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            Endianness::Big => f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
        },
        _ => 0.0,
    }
}
