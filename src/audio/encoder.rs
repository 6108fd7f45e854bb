//! Audio encoding to the supported output formats
//!
//! Every encoder produces the complete file as an in-memory byte vector;
//! the caller writes it to disk in a single operation. A cancelled or
//! failed run therefore never leaves a truncated file behind.

use std::io::Cursor;
use std::path::Path;

use crate::audio::buffer::{AudioBuffer, BitDepth};
use crate::config::{OutputFormat, OutputSpec};
use crate::error::{NormwaveError, Result};

/// Fixed MP3 bitrate; a constant-bitrate stream keeps output sizes
/// predictable across a batch
const MP3_BITRATE: mp3lame_encoder::Bitrate = mp3lame_encoder::Bitrate::Kbps192;

/// Vorbis quality on libvorbis' -0.1..1.0 scale (~160 kbps stereo)
const OGG_QUALITY: f32 = 0.5;

// =============================================================================
// Encoder trait
// =============================================================================

/// Encodes a processed buffer into a complete file image
pub trait AudioEncoder {
    /// Encode the buffer to bytes
    ///
    /// # Errors
    /// Returns `EncodeError` if the underlying codec rejects the stream
    /// parameters or fails mid-stream.
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>>;

    /// File extension this encoder produces (without the dot)
    fn extension(&self) -> &'static str;
}

/// Create the encoder for an output spec
pub fn create_encoder(spec: &OutputSpec) -> Box<dyn AudioEncoder> {
    match spec.format {
        OutputFormat::Wav => Box::new(WavEncoder::new(spec.bit_depth)),
        OutputFormat::Flac => Box::new(FlacEncoder::new(spec.bit_depth)),
        OutputFormat::Mp3 => Box::new(Mp3Encoder::new()),
        OutputFormat::Ogg => Box::new(OggEncoder::new()),
    }
}

/// Write an encoded file image to disk in one operation
///
/// The parent directory is created if missing.
pub fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Quantize a float sample to a signed integer on the 2^(bits-1) grid
///
/// Positive full scale clips to scale-1 so the value fits the integer range.
fn to_pcm(sample: f32, scale: f32) -> i32 {
    let max = scale as i32 - 1;
    ((sample.clamp(-1.0, 1.0) * scale).round() as i32).min(max)
}

// =============================================================================
// WAV
// =============================================================================

/// WAV encoder using hound
///
/// Integer PCM at 8/16/24 bits; 32-bit writes IEEE float samples.
pub struct WavEncoder {
    bit_depth: BitDepth,
}

impl WavEncoder {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }
}

impl AudioEncoder for WavEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let cursor = Cursor::new(&mut output);

        let spec = hound::WavSpec {
            channels: buffer.num_channels() as u16,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.bit_depth.bits(),
            sample_format: if self.bit_depth == BitDepth::ThirtyTwo {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        };

        let mut writer = hound::WavWriter::new(cursor, spec).map_err(|e| {
            NormwaveError::EncodeError {
                reason: format!("WAV writer init failed: {}", e),
            }
        })?;

        let scale = self.bit_depth.scale();
        let write_err = |e: hound::Error| NormwaveError::EncodeError {
            reason: format!("WAV write failed: {}", e),
        };

        match self.bit_depth {
            BitDepth::Eight => {
                for &sample in buffer.samples() {
                    writer
                        .write_sample(to_pcm(sample, scale) as i8)
                        .map_err(write_err)?;
                }
            }
            BitDepth::Sixteen => {
                for &sample in buffer.samples() {
                    writer
                        .write_sample(to_pcm(sample, scale) as i16)
                        .map_err(write_err)?;
                }
            }
            BitDepth::TwentyFour => {
                for &sample in buffer.samples() {
                    writer
                        .write_sample(to_pcm(sample, scale))
                        .map_err(write_err)?;
                }
            }
            BitDepth::ThirtyTwo => {
                for &sample in buffer.samples() {
                    writer
                        .write_sample(sample.clamp(-1.0, 1.0))
                        .map_err(write_err)?;
                }
            }
        }

        writer.finalize().map_err(|e| NormwaveError::EncodeError {
            reason: format!("WAV finalize failed: {}", e),
        })?;

        Ok(output)
    }

    fn extension(&self) -> &'static str {
        "wav"
    }
}

// =============================================================================
// FLAC
// =============================================================================

/// FLAC encoder using flac-bound (libFLAC)
pub struct FlacEncoder {
    bit_depth: BitDepth,
}

impl FlacEncoder {
    pub fn new(bit_depth: BitDepth) -> Self {
        Self { bit_depth }
    }
}

impl AudioEncoder for FlacEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>> {
        use flac_bound::{FlacEncoder as FlacEnc, WriteWrapper};

        // libFLAC caps streams at 24-bit
        if self.bit_depth == BitDepth::ThirtyTwo {
            return Err(NormwaveError::EncodeError {
                reason: "FLAC output supports at most 24-bit depth".to_string(),
            });
        }

        let mut output = Vec::new();
        let mut wrapper = WriteWrapper(&mut output);

        let encoder_config = FlacEnc::new()
            .ok_or_else(|| NormwaveError::EncodeError {
                reason: "FLAC encoder init failed".to_string(),
            })?
            .channels(buffer.num_channels() as u32)
            .sample_rate(buffer.sample_rate())
            .bits_per_sample(self.bit_depth.bits() as u32)
            .compression_level(5);

        let mut encoder =
            encoder_config
                .init_write(&mut wrapper)
                .map_err(|e| NormwaveError::EncodeError {
                    reason: format!("FLAC init failed: {:?}", e),
                })?;

        let scale = self.bit_depth.scale();
        let samples: Vec<i32> = buffer.samples().iter().map(|&s| to_pcm(s, scale)).collect();

        // Feed libFLAC in moderate blocks
        let channels = buffer.num_channels();
        let block_frames = 4096;
        for block in samples.chunks(block_frames * channels) {
            encoder
                .process_interleaved(block, (block.len() / channels) as u32)
                .map_err(|_| NormwaveError::EncodeError {
                    reason: "FLAC stream processing failed".to_string(),
                })?;
        }

        if encoder.finish().is_err() {
            return Err(NormwaveError::EncodeError {
                reason: "FLAC finalize failed".to_string(),
            });
        }

        Ok(output)
    }

    fn extension(&self) -> &'static str {
        "flac"
    }
}

// =============================================================================
// MP3
// =============================================================================

/// MP3 encoder using LAME via mp3lame-encoder
///
/// LAME consumes 16-bit PCM, so the requested bit depth does not apply here;
/// output is CBR at a fixed bitrate.
pub struct Mp3Encoder;

impl Mp3Encoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Mp3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for Mp3Encoder {
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>> {
        use mp3lame_encoder::{Builder, DualPcm, FlushNoGap};

        let mut builder = Builder::new().ok_or_else(|| NormwaveError::EncodeError {
            reason: "LAME encoder init failed".to_string(),
        })?;

        builder
            .set_num_channels(buffer.num_channels() as u8)
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME set channels failed: {:?}", e),
            })?;
        builder
            .set_sample_rate(buffer.sample_rate())
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME set sample rate failed: {:?}", e),
            })?;
        builder
            .set_brate(MP3_BITRATE)
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME set bitrate failed: {:?}", e),
            })?;
        builder
            .set_quality(mp3lame_encoder::Quality::Best)
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME set quality failed: {:?}", e),
            })?;

        let mut encoder = builder.build().map_err(|e| NormwaveError::EncodeError {
            reason: format!("LAME build failed: {:?}", e),
        })?;

        // LAME takes planar 16-bit PCM; mono input feeds both planes
        let num_frames = buffer.num_frames();
        let mut left: Vec<i16> = Vec::with_capacity(num_frames);
        let mut right: Vec<i16> = Vec::with_capacity(num_frames);
        let samples = buffer.samples();

        if buffer.num_channels() == 2 {
            for i in 0..num_frames {
                left.push(to_pcm(samples[i * 2], 32768.0) as i16);
                right.push(to_pcm(samples[i * 2 + 1], 32768.0) as i16);
            }
        } else {
            for &s in samples {
                let pcm = to_pcm(s, 32768.0) as i16;
                left.push(pcm);
                right.push(pcm);
            }
        }

        let mut mp3_output: Vec<u8> =
            Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(num_frames));

        let input = DualPcm {
            left: &left,
            right: &right,
        };

        let encoded_size = encoder
            .encode(input, mp3_output.spare_capacity_mut())
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME encode failed: {:?}", e),
            })?;
        // SAFETY: encoder wrote encoded_size bytes into spare capacity
        unsafe {
            mp3_output.set_len(encoded_size);
        }

        mp3_output.reserve(7200);
        let flush_size = encoder
            .flush::<FlushNoGap>(mp3_output.spare_capacity_mut())
            .map_err(|e| NormwaveError::EncodeError {
                reason: format!("LAME flush failed: {:?}", e),
            })?;
        // SAFETY: encoder wrote flush_size bytes into spare capacity
        unsafe {
            mp3_output.set_len(mp3_output.len() + flush_size);
        }

        Ok(mp3_output)
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

// =============================================================================
// OGG Vorbis
// =============================================================================

/// OGG Vorbis encoder using vorbis-encoder (libvorbis)
///
/// Like MP3, the codec is handed 16-bit PCM regardless of requested depth.
pub struct OggEncoder;

impl OggEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OggEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for OggEncoder {
    fn encode(&self, buffer: &AudioBuffer) -> Result<Vec<u8>> {
        use vorbis_encoder::Encoder;

        let mut encoder = Encoder::new(
            buffer.num_channels() as u32,
            buffer.sample_rate() as u64,
            OGG_QUALITY,
        )
        .map_err(|e| NormwaveError::EncodeError {
            reason: format!("Vorbis encoder init failed: {}", e),
        })?;

        let samples_i16: Vec<i16> = buffer
            .samples()
            .iter()
            .map(|&s| to_pcm(s, 32768.0) as i16)
            .collect();

        let mut ogg_data =
            encoder
                .encode(&samples_i16)
                .map_err(|e| NormwaveError::EncodeError {
                    reason: format!("Vorbis encode failed: {}", e),
                })?;

        let flush_data = encoder.flush().map_err(|e| NormwaveError::EncodeError {
            reason: format!("Vorbis flush failed: {}", e),
        })?;
        ogg_data.extend(flush_data);

        Ok(ogg_data)
    }

    fn extension(&self) -> &'static str {
        "ogg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_buffer(samples: Vec<f32>, sample_rate: u32) -> AudioBuffer {
        AudioBuffer::from_interleaved(samples, 2, sample_rate, BitDepth::Sixteen).unwrap()
    }

    #[test]
    fn test_wav_encoder_header() {
        let buffer = stereo_buffer(vec![0.5, -0.5, 0.25, -0.25], 44100);
        let encoder = WavEncoder::new(BitDepth::Sixteen);
        let data = encoder.encode(&buffer).unwrap();

        assert!(!data.is_empty());
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(encoder.extension(), "wav");
    }

    #[test]
    fn test_wav_encoder_all_depths() {
        let buffer = stereo_buffer(vec![0.5, -0.5, 0.25, -0.25], 44100);
        for depth in [
            BitDepth::Eight,
            BitDepth::Sixteen,
            BitDepth::TwentyFour,
            BitDepth::ThirtyTwo,
        ] {
            let data = WavEncoder::new(depth).encode(&buffer).unwrap();
            assert_eq!(&data[0..4], b"RIFF", "bad header at {}", depth);
        }
    }

    #[test]
    fn test_wav_round_trip_is_exact_on_grid() {
        // Samples already on the 16-bit grid survive encode/decode unchanged
        let step = BitDepth::Sixteen.step();
        let samples = vec![100.0 * step, -200.0 * step, 0.0, 16000.0 * step];
        let buffer = stereo_buffer(samples.clone(), 44100);

        let data = WavEncoder::new(BitDepth::Sixteen).encode(&buffer).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(data)).unwrap();
        let decoded: Vec<f32> = reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f32 / 32768.0)
            .collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_flac_encoder_header() {
        let buffer = stereo_buffer(vec![0.1; 8820], 44100);
        let encoder = FlacEncoder::new(BitDepth::Sixteen);
        let data = encoder.encode(&buffer).unwrap();

        assert!(data.len() > 4);
        assert_eq!(&data[0..4], b"fLaC");
    }

    #[test]
    fn test_flac_rejects_32_bit() {
        let buffer = stereo_buffer(vec![0.1; 100], 44100);
        let result = FlacEncoder::new(BitDepth::ThirtyTwo).encode(&buffer);
        assert!(result.is_err());
    }

    #[test]
    fn test_mp3_encoder() {
        let buffer = stereo_buffer(vec![0.3; 8820], 44100);
        let data = Mp3Encoder::new().encode(&buffer).unwrap();
        assert!(!data.is_empty());
    }

    #[test]
    fn test_mp3_encoder_mono() {
        let buffer =
            AudioBuffer::from_interleaved(vec![0.3; 4410], 1, 44100, BitDepth::Sixteen).unwrap();
        let data = Mp3Encoder::new().encode(&buffer).unwrap();
        assert!(!data.is_empty());
    }

    #[test]
    fn test_ogg_encoder() {
        let buffer = stereo_buffer(vec![0.3; 8820], 44100);
        let data = OggEncoder::new().encode(&buffer).unwrap();
        assert!(data.len() > 4);
        assert_eq!(&data[0..4], b"OggS");
    }

    #[test]
    fn test_create_encoder_extensions() {
        use crate::config::{ChannelMode, OutputSpec};

        let mut spec = OutputSpec {
            format: OutputFormat::Wav,
            bit_depth: BitDepth::Sixteen,
            channels: ChannelMode::Stereo,
            sample_rate: 44100,
        };
        assert_eq!(create_encoder(&spec).extension(), "wav");
        spec.format = OutputFormat::Flac;
        assert_eq!(create_encoder(&spec).extension(), "flac");
        spec.format = OutputFormat::Mp3;
        assert_eq!(create_encoder(&spec).extension(), "mp3");
        spec.format = OutputFormat::Ogg;
        assert_eq!(create_encoder(&spec).extension(), "ogg");
    }

    #[test]
    fn test_write_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/file.wav");
        write_output(&path, b"RIFF").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }

    #[test]
    fn test_to_pcm_clamps_full_scale() {
        assert_eq!(to_pcm(1.0, 32768.0), 32767);
        assert_eq!(to_pcm(-1.0, 32768.0), -32768);
        assert_eq!(to_pcm(0.0, 32768.0), 0);
        assert_eq!(to_pcm(2.0, 32768.0), 32767);
    }
}
