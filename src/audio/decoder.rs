//! Audio decoding via Symphonia
//!
//! Decodes an entire input file into an interleaved f32 `AudioBuffer`.
//! Codec and container parsing is Symphonia's job; this adapter only
//! converts whatever sample format comes back into the internal float
//! representation with symmetric scaling.

use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::buffer::{AudioBuffer, BitDepth};
use crate::error::{NormwaveError, Result};

/// Decode an audio file into an interleaved buffer
///
/// Mono and stereo inputs keep their channel layout; anything with more
/// channels is rejected as unsupported (the converter only remixes between
/// mono and stereo).
///
/// # Errors
/// * `FileNotFound` - the path does not exist
/// * `UnsupportedFormat` - no decodable audio track, or >2 channels
/// * `DecodeError` - the stream is corrupt or unreadable
/// * `EmptyAudio` - the file decoded to zero samples
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(NormwaveError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| NormwaveError::DecodeError {
            reason: format!("failed to probe {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        })?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| NormwaveError::UnsupportedFormat {
            format: format!("{}: no audio tracks found", path.display()),
        })?;

    // Some containers omit the channel layout from the track header; the
    // authoritative count comes from the first decoded packet's signal spec.
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels: Option<usize> = match track.codec_params.channels.map(|c| c.count()) {
        Some(count) => Some(validate_channel_count(count)?),
        None => None,
    };
    let bit_depth = track
        .codec_params
        .bits_per_sample
        .and_then(|bits| BitDepth::from_bits(bits as u16))
        .unwrap_or(BitDepth::Sixteen);
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| NormwaveError::DecodeError {
            reason: format!("failed to create decoder: {}", e),
            source: Some(Box::new(e)),
        })?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Normal end of stream
                break;
            }
            Err(e) => {
                return Err(NormwaveError::DecodeError {
                    reason: format!("error reading packet: {}", e),
                    source: Some(Box::new(e)),
                });
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| NormwaveError::DecodeError {
                reason: format!("decode error in {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })?;

        let spec = decoded.spec();
        let packet_channels = spec.channels.count();
        let channels = match channels {
            Some(count) if count == packet_channels => count,
            Some(count) => {
                return Err(NormwaveError::DecodeError {
                    reason: format!(
                        "channel count changed mid-stream ({} -> {})",
                        count, packet_channels
                    ),
                    source: None,
                });
            }
            None => {
                let count = validate_channel_count(packet_channels)?;
                channels = Some(count);
                count
            }
        };
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }

        append_interleaved(&decoded, channels, &mut all_samples);
    }

    // `channels` is set by the first decoded packet, so it is still None
    // exactly when nothing was decoded
    let channels = match channels {
        Some(count) if !all_samples.is_empty() => count,
        _ => return Err(NormwaveError::EmptyAudio),
    };
    let sample_rate = sample_rate.unwrap_or(44100);

    log::debug!(
        "decoded {}: {} frames, {} ch, {} Hz, {}",
        path.display(),
        all_samples.len() / channels,
        channels,
        sample_rate,
        bit_depth
    );

    AudioBuffer::from_interleaved(all_samples, channels, sample_rate, bit_depth)
}

/// Reject channel layouts the converter cannot remix
fn validate_channel_count(count: usize) -> Result<usize> {
    if count == 0 || count > 2 {
        return Err(NormwaveError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", count),
        });
    }
    Ok(count)
}

/// Append one decoded packet's samples, interleaved, converting to f32
///
/// Signed integers use symmetric scaling (divide by 2^(N-1)) so the float
/// range stays centered on zero; unsigned formats are recentered first.
fn append_interleaved(decoded: &AudioBufferRef, channels: usize, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => {
            interleave_planes(buf, channels, out, |s| s.clamp(-1.0, 1.0));
        }
        AudioBufferRef::F64(buf) => {
            interleave_planes(buf, channels, out, |s| (s as f32).clamp(-1.0, 1.0));
        }
        AudioBufferRef::S32(buf) => {
            interleave_planes(buf, channels, out, |s| s as f32 / 2147483648.0);
        }
        AudioBufferRef::S24(buf) => {
            interleave_planes(buf, channels, out, |s| s.inner() as f32 / 8388608.0);
        }
        AudioBufferRef::S16(buf) => {
            interleave_planes(buf, channels, out, |s| s as f32 / 32768.0);
        }
        AudioBufferRef::S8(buf) => {
            interleave_planes(buf, channels, out, |s| s as f32 / 128.0);
        }
        AudioBufferRef::U32(buf) => {
            interleave_planes(buf, channels, out, |s| {
                (s as f32 / u32::MAX as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U24(buf) => {
            interleave_planes(buf, channels, out, |s| {
                (s.inner() as f32 / 16777215.0) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U16(buf) => {
            interleave_planes(buf, channels, out, |s| {
                (s as f32 / u16::MAX as f32) * 2.0 - 1.0
            });
        }
        AudioBufferRef::U8(buf) => {
            interleave_planes(buf, channels, out, |s| {
                (s as f32 / u8::MAX as f32) * 2.0 - 1.0
            });
        }
    }
}

/// Interleave the planar channels of a Symphonia buffer into `out`
fn interleave_planes<T, F>(
    buf: &symphonia::core::audio::AudioBuffer<T>,
    channels: usize,
    out: &mut Vec<f32>,
    convert: F,
) where
    T: symphonia::core::sample::Sample + Copy,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    out.reserve(frames * channels);

    match channels {
        1 => {
            let mono = buf.chan(0);
            for i in 0..frames {
                out.push(convert(mono[i]));
            }
        }
        _ => {
            let left = buf.chan(0);
            let right = buf.chan(1);
            for i in 0..frames {
                out.push(convert(left[i]));
                out.push(convert(right[i]));
            }
        }
    }
}
