//! Gain calculation and application
//!
//! The gain that moves the measured level onto the target is applied
//! uniformly to every sample. RMS targets can push individual peaks past
//! full scale; those samples are clamped and counted rather than failing
//! the file.

use crate::audio::AudioBuffer;
use crate::config::LoudnessTarget;
use crate::pipeline::analyzer::Measurement;

/// What the gain stage did to a buffer
#[derive(Debug, Clone, Copy)]
pub struct GainReport {
    /// Level measured before gain, in dBFS (negative infinity for silence)
    pub measured_db: f32,
    /// Gain applied, in dB
    pub gain_db: f32,
    /// Samples clamped to full scale after gain
    pub clipped_samples: usize,
    /// True when the input was silent and passed through untouched
    pub silent: bool,
}

/// Apply the gain that brings `measurement` onto `target`
///
/// Input with no measurable level on the chosen scale (silence, or an
/// opposite-phase stereo pair under the loudness method) is passed through
/// with zero gain; no finite gain can reach the target from there.
pub fn apply_gain(
    mut buffer: AudioBuffer,
    measurement: &Measurement,
    target: &LoudnessTarget,
) -> (AudioBuffer, GainReport) {
    let measured_db = measurement.level_db(target.method);

    if !measured_db.is_finite() {
        log::warn!("no measurable level for this method, passing through without gain");
        return (
            buffer,
            GainReport {
                measured_db,
                gain_db: 0.0,
                clipped_samples: 0,
                silent: true,
            },
        );
    }

    let gain_db = target.level_db - measured_db;
    let gain_linear = 10.0_f32.powf(gain_db / 20.0);

    let mut clipped_samples = 0usize;
    for sample in buffer.samples_mut() {
        let scaled = *sample * gain_linear;
        if scaled > 1.0 {
            *sample = 1.0;
            clipped_samples += 1;
        } else if scaled < -1.0 {
            *sample = -1.0;
            clipped_samples += 1;
        } else {
            *sample = scaled;
        }
    }

    if clipped_samples > 0 {
        log::warn!(
            "gain of {:.2} dB clipped {} samples at full scale",
            gain_db,
            clipped_samples
        );
    }
    log::debug!(
        "applied {:.2} dB ({} -> {:.2} dBFS target)",
        gain_db,
        measured_db,
        target.level_db
    );

    (
        buffer,
        GainReport {
            measured_db,
            gain_db,
            clipped_samples,
            silent: false,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BitDepth;
    use crate::config::NormalizeMethod;
    use crate::pipeline::analyzer::measure;
    use approx::assert_relative_eq;

    fn buffer_of(samples: Vec<f32>) -> AudioBuffer {
        AudioBuffer::from_interleaved(samples, 1, 44100, BitDepth::Sixteen).unwrap()
    }

    fn peak_target(level_db: f32) -> LoudnessTarget {
        LoudnessTarget {
            level_db,
            method: NormalizeMethod::Peak,
        }
    }

    #[test]
    fn test_peak_gain_reaches_target() {
        // Peak at -6.02 dB, target -3 dB
        let buffer = buffer_of(vec![0.5, -0.5, 0.1, 0.0]);
        let m = measure(&buffer);
        let (out, report) = apply_gain(buffer, &m, &peak_target(-3.0));

        let new_peak = measure(&out).peak_db;
        assert_relative_eq!(new_peak, -3.0, epsilon = 0.01);
        assert_relative_eq!(report.gain_db, -3.0 - m.peak_db, epsilon = 1e-4);
        assert_eq!(report.clipped_samples, 0);
        assert!(!report.silent);
    }

    #[test]
    fn test_attenuation() {
        let buffer = buffer_of(vec![0.9, -0.9]);
        let m = measure(&buffer);
        let (out, report) = apply_gain(buffer, &m, &peak_target(-12.0));

        assert!(report.gain_db < 0.0);
        assert_relative_eq!(measure(&out).peak_db, -12.0, epsilon = 0.01);
    }

    #[test]
    fn test_silent_input_passes_through() {
        let buffer = buffer_of(vec![0.0; 100]);
        let m = measure(&buffer);
        let (out, report) = apply_gain(buffer, &m, &peak_target(-3.0));

        assert!(report.silent);
        assert_eq!(report.gain_db, 0.0);
        assert!(out.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_rms_target_clips_peaks() {
        // Mostly quiet with one loud sample: raising RMS pushes the peak
        // past full scale
        let mut samples = vec![0.01f32; 1000];
        samples[0] = 0.9;
        let buffer = buffer_of(samples);
        let m = measure(&buffer);

        let target = LoudnessTarget {
            level_db: -3.0,
            method: NormalizeMethod::Rms,
        };
        let (out, report) = apply_gain(buffer, &m, &target);

        assert!(report.clipped_samples > 0);
        let peak = out.samples().iter().fold(0.0f32, |a, &s| a.max(s.abs()));
        assert!(peak <= 1.0);
    }

    #[test]
    fn test_loudness_gain_uses_downmix_level() {
        let buffer = buffer_of(vec![0.1; 44100]);
        let m = measure(&buffer);
        // Constant mono signal: loudness is -20 - 23 = -43 dB
        let target = LoudnessTarget {
            level_db: -23.0,
            method: NormalizeMethod::Loudness,
        };
        let (out, report) = apply_gain(buffer, &m, &target);
        assert_relative_eq!(report.gain_db, 20.0, epsilon = 0.05);
        assert_relative_eq!(measure(&out).peak_db, 0.0, epsilon = 0.05);
    }

    #[test]
    fn test_unmeasurable_loudness_passes_through() {
        // Opposite-phase stereo cancels in the mono downmix
        let samples: Vec<f32> = std::iter::repeat([0.5f32, -0.5]).take(500).flatten().collect();
        let buffer =
            AudioBuffer::from_interleaved(samples, 2, 44100, BitDepth::Sixteen).unwrap();
        let m = measure(&buffer);
        assert!(!m.is_silent());

        let target = LoudnessTarget {
            level_db: -23.0,
            method: NormalizeMethod::Loudness,
        };
        let (out, report) = apply_gain(buffer, &m, &target);
        assert!(report.silent);
        assert_eq!(report.gain_db, 0.0);
        assert!(out.samples().iter().all(|s| s.is_finite()));
        assert_eq!(out.samples()[0], 0.5);
    }

    #[test]
    fn test_zero_gain_when_already_at_target() {
        let buffer = buffer_of(vec![0.5, -0.5]);
        let m = measure(&buffer);
        let (_, report) = apply_gain(buffer, &m, &peak_target(m.peak_db));
        assert_relative_eq!(report.gain_db, 0.0, epsilon = 1e-5);
    }
}
