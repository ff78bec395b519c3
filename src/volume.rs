//! Stereo volume and gain conversion
//!
//! Converts the host's stereo percentage pair into the single linear gain
//! factor the backend accepts. The mapping is logarithmic over a 40 dB
//! range: 100% is unity gain, 0% is silence.

/// Attenuation range of the volume control, in decibels
pub const VOLUME_RANGE_DB: f32 = 40.0;

/// Stereo volume as integer percentages.
///
/// Persisted across stream open/close; independent of stream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoVolume {
    /// Left channel percent (0..=100)
    pub left: u8,

    /// Right channel percent (0..=100)
    pub right: u8,
}

impl StereoVolume {
    /// Full volume on both channels (the persisted default)
    pub const FULL: StereoVolume = StereoVolume { left: 100, right: 100 };

    /// Create a volume pair, clamping each channel to 100
    pub fn new(left: u8, right: u8) -> Self {
        Self {
            left: left.min(100),
            right: right.min(100),
        }
    }
}

impl Default for StereoVolume {
    fn default() -> Self {
        Self::FULL
    }
}

/// Convert a stereo percentage pair to the backend's linear gain factor.
///
/// `0.0` when both channels are zero, else
/// `10^(VOLUME_RANGE_DB * (max(left, right) - 100) / 100 / 20)`.
///
/// The backend exposes a single master gain control, so only the louder
/// channel drives the attenuation; the quieter channel is not attenuated
/// independently. Hosts that need per-channel precision cannot get it at
/// this seam.
pub fn gain_factor(v: StereoVolume) -> f32 {
    let loudest = v.left.max(v.right);

    if loudest == 0 {
        0.0
    } else {
        10f32.powf(VOLUME_RANGE_DB * (loudest as f32 - 100.0) / 100.0 / 20.0)
    }
}
