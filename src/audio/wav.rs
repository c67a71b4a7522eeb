//! WAV file I/O via `hound`.
//!
//! Reading accepts integer PCM of any bit depth (scaled to `[-1.0, 1.0]`) and
//! 32-bit float.  Writing always produces 16-bit PCM, clamped.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::{AudioError, RawAudio, Waveform};

/// Read a WAV file into interleaved [`RawAudio`].
pub fn read_wav(path: impl AsRef<Path>) -> Result<RawAudio, AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::NoChannels);
    }

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<Vec<f32>, _>>()?
        }
    };

    Ok(RawAudio::new(samples, spec.channels, spec.sample_rate))
}

/// Write a mono [`Waveform`] as 16-bit PCM.
pub fn write_wav(path: impl AsRef<Path>, waveform: &Waveform) -> Result<(), AudioError> {
    if waveform.sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate(0));
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in &waveform.samples {
        let scaled = (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()?;
    Ok(())
}
