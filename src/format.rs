//! Sample-format resolution
//!
//! Maps the host's abstract format tags to concrete hardware sample
//! descriptors (bit width, signedness, byte order). The resolver is a fixed
//! nine-entry table: 16- and 32-bit signed/unsigned integer in both byte
//! orders, plus 32-bit float (little-endian only). Tags outside the table
//! fail with [`Error::UnsupportedFormat`], which is fatal for the `open`
//! that requested them.
//!
//! Hardware support for a resolved format is a separate single probe against
//! the backend (`OutputBackend::supports_format`); there is no fallback
//! negotiation.

use crate::error::{Error, Result};

/// Abstract sample-format tag as supplied by the host playback pipeline.
///
/// The tag set is wider than what the sink supports: 8-bit and 24-bit tags
/// exist in host pipelines but have no entry in the resolver table and are
/// rejected at `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S24Le,
    S24Be,
    U24Le,
    U24Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    F32,
}

/// Sample value interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    SignedInt,
    UnsignedInt,
    Float,
}

/// Sample byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Concrete stream format negotiated at `open`.
///
/// Immutable once a stream is open; recomputed entirely on each open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: u16,

    /// Bits per sample (16 or 32)
    pub bits: u16,

    /// Sample value interpretation
    pub kind: SampleKind,

    /// Sample byte order
    pub endian: Endianness,
}

impl StreamFormat {
    /// Bytes occupied by one sample of one channel
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits / 8) as usize
    }

    /// Bytes occupied by one frame (one sample per channel)
    pub fn frame_bytes(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

/// The fixed resolver table: tag → (bits, kind, endianness)
const FORMAT_TABLE: [(FormatTag, u16, SampleKind, Endianness); 9] = [
    (FormatTag::S16Le, 16, SampleKind::SignedInt, Endianness::Little),
    (FormatTag::S16Be, 16, SampleKind::SignedInt, Endianness::Big),
    (FormatTag::U16Le, 16, SampleKind::UnsignedInt, Endianness::Little),
    (FormatTag::U16Be, 16, SampleKind::UnsignedInt, Endianness::Big),
    (FormatTag::S32Le, 32, SampleKind::SignedInt, Endianness::Little),
    (FormatTag::S32Be, 32, SampleKind::SignedInt, Endianness::Big),
    (FormatTag::U32Le, 32, SampleKind::UnsignedInt, Endianness::Little),
    (FormatTag::U32Be, 32, SampleKind::UnsignedInt, Endianness::Big),
    (FormatTag::F32, 32, SampleKind::Float, Endianness::Little),
];

/// Resolve an abstract format tag to a concrete stream format.
///
/// # Arguments
/// * `tag` - Host format tag
/// * `sample_rate` - Sample rate in Hz (must be > 0)
/// * `channels` - Channel count (must be > 0)
///
/// # Errors
/// [`Error::UnsupportedFormat`] if the tag has no entry in the table.
pub fn resolve(tag: FormatTag, sample_rate: u32, channels: u16) -> Result<StreamFormat> {
    FORMAT_TABLE
        .iter()
        .find(|(t, _, _, _)| *t == tag)
        .map(|&(_, bits, kind, endian)| StreamFormat {
            sample_rate,
            channels,
            bits,
            kind,
            endian,
        })
        .ok_or(Error::UnsupportedFormat(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_supported_tags() {
        let cases = [
            (FormatTag::S16Le, 16, SampleKind::SignedInt, Endianness::Little),
            (FormatTag::S16Be, 16, SampleKind::SignedInt, Endianness::Big),
            (FormatTag::U16Le, 16, SampleKind::UnsignedInt, Endianness::Little),
            (FormatTag::U16Be, 16, SampleKind::UnsignedInt, Endianness::Big),
            (FormatTag::S32Le, 32, SampleKind::SignedInt, Endianness::Little),
            (FormatTag::S32Be, 32, SampleKind::SignedInt, Endianness::Big),
            (FormatTag::U32Le, 32, SampleKind::UnsignedInt, Endianness::Little),
            (FormatTag::U32Be, 32, SampleKind::UnsignedInt, Endianness::Big),
            (FormatTag::F32, 32, SampleKind::Float, Endianness::Little),
        ];

        for (tag, bits, kind, endian) in cases {
            let format = resolve(tag, 44100, 2).unwrap();
            assert_eq!(format.bits, bits, "{:?}", tag);
            assert_eq!(format.kind, kind, "{:?}", tag);
            assert_eq!(format.endian, endian, "{:?}", tag);
            assert_eq!(format.sample_rate, 44100);
            assert_eq!(format.channels, 2);
        }
    }

    #[test]
    fn test_resolve_unsupported_tags() {
        for tag in [
            FormatTag::S8,
            FormatTag::U8,
            FormatTag::S24Le,
            FormatTag::S24Be,
            FormatTag::U24Le,
            FormatTag::U24Be,
        ] {
            let result = resolve(tag, 44100, 2);
            assert!(
                matches!(result, Err(Error::UnsupportedFormat(t)) if t == tag),
                "{:?} should be unsupported",
                tag
            );
        }
    }

    #[test]
    fn test_frame_bytes() {
        let s16_stereo = resolve(FormatTag::S16Le, 44100, 2).unwrap();
        assert_eq!(s16_stereo.bytes_per_sample(), 2);
        assert_eq!(s16_stereo.frame_bytes(), 4);

        let f32_mono = resolve(FormatTag::F32, 48000, 1).unwrap();
        assert_eq!(f32_mono.bytes_per_sample(), 4);
        assert_eq!(f32_mono.frame_bytes(), 4);

        let s32_quad = resolve(FormatTag::S32Be, 96000, 4).unwrap();
        assert_eq!(s32_quad.frame_bytes(), 16);
    }
}
