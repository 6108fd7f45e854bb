//! Audio buffer type shared across the processing pipeline
//!
//! Samples are stored interleaved: [L0, R0, L1, R1, ...]. This matches the
//! layout of the audio file formats we read and write and keeps encoding
//! a straight pass over the sample slice.

use std::fmt;

use crate::error::{NormwaveError, Result};

/// Bit depth of the quantization grid a buffer is (or will be) stored at
///
/// Samples are held as f32 in [-1.0, 1.0] regardless of depth; the depth
/// records which grid the values were quantized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 8-bit signed PCM
    Eight,
    /// 16-bit signed PCM (CD quality)
    Sixteen,
    /// 24-bit signed PCM
    TwentyFour,
    /// 32-bit (integer grid for quantization, float on disk for WAV)
    ThirtyTwo,
}

impl BitDepth {
    /// Number of bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Parse from a bit count; anything outside {8, 16, 24, 32} is rejected
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            24 => Some(BitDepth::TwentyFour),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None,
        }
    }

    /// Positive full-scale value of the integer grid (2^(bits-1))
    ///
    /// Dividing by this maps the signed integer range onto a symmetric
    /// [-1.0, 1.0) float range and back without DC bias.
    pub fn scale(&self) -> f32 {
        (1i64 << (self.bits() - 1)) as f32
    }

    /// Size of one quantization step at this depth
    pub fn step(&self) -> f32 {
        1.0 / self.scale()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Interleaved audio buffer
///
/// Each pipeline stage consumes a buffer and produces a new one; buffers
/// are never shared between files.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    /// Interleaved sample data in [-1.0, 1.0]
    samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo)
    num_channels: usize,
    /// Sample rate in Hz
    sample_rate: u32,
    /// Quantization grid the samples came from / are destined for
    bit_depth: BitDepth,
}

impl AudioBuffer {
    /// Create a buffer from existing interleaved samples
    ///
    /// # Errors
    /// Returns `ProcessingError` if the sample count is not divisible by
    /// the channel count, or the channel count / sample rate is zero.
    pub fn from_interleaved(
        samples: Vec<f32>,
        num_channels: usize,
        sample_rate: u32,
        bit_depth: BitDepth,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(NormwaveError::ProcessingError {
                reason: "channel count must be positive".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(NormwaveError::ProcessingError {
                reason: "sample rate must be positive".to_string(),
            });
        }
        if samples.len() % num_channels != 0 {
            return Err(NormwaveError::ProcessingError {
                reason: format!(
                    "sample count {} is not divisible by channel count {}",
                    samples.len(),
                    num_channels
                ),
            });
        }
        Ok(Self {
            samples,
            num_channels,
            sample_rate,
            bit_depth,
        })
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.num_channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Quantization depth
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// All interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Mutable access to the interleaved samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Consume the buffer, returning the raw interleaved samples
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at the given frame and channel, if in range
    pub fn get(&self, frame: usize, channel: usize) -> Option<f32> {
        if frame < self.num_frames() && channel < self.num_channels {
            Some(self.samples[frame * self.num_channels + channel])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        let buf =
            AudioBuffer::from_interleaved(vec![0.0; 400], 2, 44100, BitDepth::Sixteen).unwrap();
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_frames(), 200);
        assert_eq!(buf.sample_rate(), 44100);
        assert_eq!(buf.bit_depth(), BitDepth::Sixteen);
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_frames() {
        let result = AudioBuffer::from_interleaved(vec![0.0; 5], 2, 44100, BitDepth::Sixteen);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_interleaved_rejects_zero_channels() {
        let result = AudioBuffer::from_interleaved(vec![], 0, 44100, BitDepth::Sixteen);
        assert!(result.is_err());
    }

    #[test]
    fn test_duration() {
        let buf =
            AudioBuffer::from_interleaved(vec![0.0; 88200], 2, 44100, BitDepth::Sixteen).unwrap();
        assert!((buf.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_get_indexing() {
        let buf = AudioBuffer::from_interleaved(
            vec![0.1, 0.2, 0.3, 0.4],
            2,
            48000,
            BitDepth::TwentyFour,
        )
        .unwrap();
        assert_eq!(buf.get(0, 0), Some(0.1));
        assert_eq!(buf.get(0, 1), Some(0.2));
        assert_eq!(buf.get(1, 0), Some(0.3));
        assert_eq!(buf.get(2, 0), None);
        assert_eq!(buf.get(0, 2), None);
    }

    #[test]
    fn test_bit_depth_scale() {
        assert_eq!(BitDepth::Eight.scale(), 128.0);
        assert_eq!(BitDepth::Sixteen.scale(), 32768.0);
        assert_eq!(BitDepth::TwentyFour.scale(), 8388608.0);
        assert_eq!(BitDepth::from_bits(24), Some(BitDepth::TwentyFour));
        assert_eq!(BitDepth::from_bits(12), None);
    }
}
