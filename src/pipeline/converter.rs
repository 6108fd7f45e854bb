//! Format conversion: channel remixing, resampling, requantization
//!
//! Conversion runs after gain so the normalized level is what lands in
//! the output file. Order matters: remix first (cheapest), then resample,
//! then snap to the output quantization grid.

use crate::audio::{AudioBuffer, BitDepth};
use crate::config::{ChannelMode, OutputSpec};
use crate::error::Result;

/// Convert a buffer to the output spec's channel layout, sample rate and
/// bit depth
pub fn convert(buffer: AudioBuffer, spec: &OutputSpec) -> Result<AudioBuffer> {
    let buffer = remix(buffer, spec.channels)?;
    let buffer = resample(buffer, spec.sample_rate)?;
    quantize(buffer, spec.bit_depth)
}

/// Remix between mono and stereo
///
/// Mono to stereo duplicates the channel; stereo to mono averages the
/// pair. Matching layouts pass through untouched.
pub fn remix(buffer: AudioBuffer, target: ChannelMode) -> Result<AudioBuffer> {
    let target_channels = target.count();
    if buffer.num_channels() == target_channels {
        return Ok(buffer);
    }

    let sample_rate = buffer.sample_rate();
    let bit_depth = buffer.bit_depth();
    let samples = buffer.into_samples();

    let remixed = match target {
        ChannelMode::Stereo => {
            let mut out = Vec::with_capacity(samples.len() * 2);
            for &s in &samples {
                out.push(s);
                out.push(s);
            }
            out
        }
        ChannelMode::Mono => samples
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) * 0.5)
            .collect(),
    };

    AudioBuffer::from_interleaved(remixed, target_channels, sample_rate, bit_depth)
}

/// Resample to the target rate using linear interpolation
///
/// Output length is `round(frames * target / source)`, which keeps the
/// duration within one sample period of the input. Matching rates pass
/// through untouched.
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate() == target_rate {
        return Ok(buffer);
    }

    let channels = buffer.num_channels();
    let bit_depth = buffer.bit_depth();
    let src_frames = buffer.num_frames();
    let ratio = target_rate as f64 / buffer.sample_rate() as f64;
    let dst_frames = (src_frames as f64 * ratio).round() as usize;

    let samples = buffer.samples();
    let mut resampled = Vec::with_capacity(dst_frames * channels);

    for dst_frame in 0..dst_frames {
        let src_pos = dst_frame as f64 / ratio;
        let src_frame = (src_pos.floor() as usize).min(src_frames - 1);
        let next_frame = (src_frame + 1).min(src_frames - 1);
        let frac = (src_pos - src_frame as f64) as f32;

        for ch in 0..channels {
            let s0 = samples[src_frame * channels + ch];
            let s1 = samples[next_frame * channels + ch];
            resampled.push(s0 + (s1 - s0) * frac);
        }
    }

    log::debug!(
        "resampled {} -> {} Hz ({} -> {} frames)",
        buffer.sample_rate(),
        target_rate,
        src_frames,
        dst_frames
    );

    AudioBuffer::from_interleaved(resampled, channels, target_rate, bit_depth)
}

/// Snap samples onto the quantization grid of the target bit depth
///
/// Values are rounded to the nearest representable PCM step so the float
/// buffer matches what the integer encoding will store.
pub fn quantize(buffer: AudioBuffer, target: BitDepth) -> Result<AudioBuffer> {
    let channels = buffer.num_channels();
    let sample_rate = buffer.sample_rate();
    let scale = target.scale();
    let max_code = scale - 1.0;

    let quantized: Vec<f32> = buffer
        .into_samples()
        .into_iter()
        .map(|s| ((s * scale).round().clamp(-scale, max_code)) / scale)
        .collect();

    AudioBuffer::from_interleaved(quantized, channels, sample_rate, target)
}
