//! Loudness analysis
//!
//! Peak and RMS are measured over the whole interleaved buffer, so stereo
//! imbalance does not skew the result toward either channel. The loudness
//! estimate works on a mono downmix instead, with a fixed offset relative
//! to full scale. Mean squares accumulate in f64; an f32 running sum stops
//! growing once it dwarfs the per-sample contribution, which underestimates
//! RMS on long files.

use crate::audio::AudioBuffer;
use crate::config::NormalizeMethod;

/// Numerical stability epsilon for level calculations
const EPSILON: f64 = 1e-10;

/// Offset applied to the mono-downmix RMS for the loudness estimate
const LOUDNESS_OFFSET_DB: f32 = -23.0;

/// Measured levels of a buffer, in dBFS
///
/// Silence measures as negative infinity on every scale.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    /// Absolute peak level
    pub peak_db: f32,
    /// Root-mean-square level
    pub rms_db: f32,
    /// Simplified loudness estimate (mono-downmix RMS - 23)
    pub loudness_db: f32,
}

impl Measurement {
    /// Level for the given normalization method
    pub fn level_db(&self, method: NormalizeMethod) -> f32 {
        match method {
            NormalizeMethod::Peak => self.peak_db,
            NormalizeMethod::Rms => self.rms_db,
            NormalizeMethod::Loudness => self.loudness_db,
        }
    }

    /// True when the buffer carried no measurable signal
    pub fn is_silent(&self) -> bool {
        self.peak_db == f32::NEG_INFINITY
    }
}

/// Measure peak, RMS and loudness levels of a buffer
pub fn measure(buffer: &AudioBuffer) -> Measurement {
    let samples = buffer.samples();
    let channels = buffer.num_channels();

    let peak = samples.iter().map(|&x| x.abs()).fold(0.0f32, f32::max);
    let peak_db = if peak as f64 > EPSILON {
        20.0 * peak.log10()
    } else {
        f32::NEG_INFINITY
    };

    let sum_sq = samples.iter().map(|&x| x as f64 * x as f64).sum::<f64>();
    let rms = (sum_sq / samples.len().max(1) as f64).sqrt();
    let rms_db = to_db(rms);

    // Mono downmix for the loudness estimate; opposite-phase stereo can
    // cancel here even when the buffer itself is loud
    let mono_sum_sq = samples
        .chunks_exact(channels)
        .map(|frame| {
            let mix = frame.iter().map(|&s| s as f64).sum::<f64>() / channels as f64;
            mix * mix
        })
        .sum::<f64>();
    let mono_rms = (mono_sum_sq / buffer.num_frames().max(1) as f64).sqrt();
    let loudness_db = to_db(mono_rms) + LOUDNESS_OFFSET_DB;

    log::debug!(
        "measured {} frames: peak {:.2} dBFS, rms {:.2} dBFS, loudness {:.2} dB",
        buffer.num_frames(),
        peak_db,
        rms_db,
        loudness_db
    );

    Measurement {
        peak_db,
        rms_db,
        loudness_db,
    }
}

fn to_db(linear: f64) -> f32 {
    if linear > EPSILON {
        (20.0 * linear.log10()) as f32
    } else {
        f32::NEG_INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BitDepth;
    use approx::assert_relative_eq;

    fn buffer_of(samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::from_interleaved(samples, 1, 44100, BitDepth::Sixteen).unwrap()
    }

    #[test]
    fn test_full_scale_square_measures_zero_db() {
        let m = measure(&buffer_of(vec![1.0, -1.0, 1.0, -1.0]));
        assert_relative_eq!(m.peak_db, 0.0, epsilon = 1e-4);
        assert_relative_eq!(m.rms_db, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_half_scale_peak() {
        let m = measure(&buffer_of(vec![0.5, -0.5, 0.25, 0.0]));
        // 20*log10(0.5) = -6.0206 dB
        assert_relative_eq!(m.peak_db, -6.0206, epsilon = 1e-3);
        assert!(m.rms_db < m.peak_db);
    }

    #[test]
    fn test_sine_rms_is_three_db_below_peak() {
        let samples: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let m = measure(&buffer_of(samples));
        // RMS of a sine is peak - 3.01 dB
        assert_relative_eq!(m.peak_db - m.rms_db, 3.01, epsilon = 0.05);
    }

    #[test]
    fn test_rms_stays_accurate_on_long_buffers() {
        // Half an hour of constant 0.1 amplitude; a naive f32 running sum
        // saturates a few million samples in and reads several dB low
        let m = measure(&buffer_of(vec![0.1; 80_000_000]));
        assert_relative_eq!(m.rms_db, -20.0, epsilon = 0.01);
        assert_relative_eq!(m.peak_db, -20.0, epsilon = 0.01);
    }

    #[test]
    fn test_silence_measures_negative_infinity() {
        let m = measure(&buffer_of(vec![0.0; 1000]));
        assert_eq!(m.peak_db, f32::NEG_INFINITY);
        assert_eq!(m.rms_db, f32::NEG_INFINITY);
        assert_eq!(m.loudness_db, f32::NEG_INFINITY);
        assert!(m.is_silent());
    }

    #[test]
    fn test_loudness_offset_from_mono_rms() {
        // Constant mono signal: loudness is RMS - 23
        let m = measure(&buffer_of(vec![0.1; 44100]));
        assert_relative_eq!(m.loudness_db, m.rms_db - 23.0, epsilon = 1e-3);
    }

    #[test]
    fn test_loudness_downmixes_stereo() {
        // Identical channels: downmix equals either channel
        let stereo: Vec<f32> = std::iter::repeat([0.2f32, 0.2]).take(1000).flatten().collect();
        let m = measure(
            &AudioBuffer::from_interleaved(stereo, 2, 44100, BitDepth::Sixteen).unwrap(),
        );
        assert_relative_eq!(m.loudness_db, m.rms_db - 23.0, epsilon = 1e-3);
    }

    #[test]
    fn test_opposite_phase_stereo_cancels_in_loudness() {
        let stereo: Vec<f32> = std::iter::repeat([0.5f32, -0.5]).take(1000).flatten().collect();
        let m = measure(
            &AudioBuffer::from_interleaved(stereo, 2, 44100, BitDepth::Sixteen).unwrap(),
        );
        assert_eq!(m.loudness_db, f32::NEG_INFINITY);
        assert!(!m.is_silent());
    }

    #[test]
    fn test_level_db_selects_method() {
        let m = Measurement {
            peak_db: -3.0,
            rms_db: -12.0,
            loudness_db: -35.0,
        };
        assert_eq!(m.level_db(NormalizeMethod::Peak), -3.0);
        assert_eq!(m.level_db(NormalizeMethod::Rms), -12.0);
        assert_eq!(m.level_db(NormalizeMethod::Loudness), -35.0);
    }
}
