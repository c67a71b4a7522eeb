//! In-memory audio buffers.
//!
//! [`RawAudio`] is what arrives from the outside world: interleaved samples
//! with any channel count.  [`Waveform`] is what the models consume: a single
//! mono channel.  The only way from one to the other is
//! [`Waveform::from_raw`], which averages channels, so every model input has
//! been downmixed before anything else touches it.
//!
//! # Example
//!
//! ```rust
//! use vallex_studio::audio::{RawAudio, Waveform};
//!
//! // Two stereo frames at 16-bit scale.
//! let raw = RawAudio::from_pcm16(&[16_384, 0, -16_384, 0], 2, 24_000);
//! let mut wav = Waveform::from_raw(&raw);
//! assert_eq!(wav.len(), 2);
//! assert!((wav.samples[0] - 0.25).abs() < 1e-6);
//!
//! // Already inside [-1, 1]: left untouched.
//! assert!(!wav.peak_normalize());
//! ```

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`; a trailing partial frame
/// is dropped.  `channels == 0` yields an empty vector.
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// RawAudio
// ---------------------------------------------------------------------------

/// Interleaved audio as delivered by a WAV upload or the microphone.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Interleaved samples, nominally in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Interleaved channel count (1 = mono, 2 = stereo, …).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl RawAudio {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Build from 16-bit PCM, scaling by `1 / 32768`.
    pub fn from_pcm16(samples: &[i16], channels: u16, sample_rate: u32) -> Self {
        let samples = samples.iter().map(|&s| s as f32 / 32_768.0).collect();
        Self::new(samples, channels, sample_rate)
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / n as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Waveform
// ---------------------------------------------------------------------------

/// Mono `f32` samples plus their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Downmix `raw` to mono.
    pub fn from_raw(raw: &RawAudio) -> Self {
        Self::new(stereo_to_mono(&raw.samples, raw.channels), raw.sample_rate)
    }

    /// Largest absolute sample value (0.0 for an empty buffer).
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    /// Scale down to unit peak when the signal exceeds `[-1.0, 1.0]`.
    ///
    /// Returns `true` when the samples were rescaled.
    pub fn peak_normalize(&mut self) -> bool {
        let peak = self.peak();
        if peak <= 1.0 {
            return false;
        }
        for s in &mut self.samples {
            *s /= peak;
        }
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_to_mono_collapses_channel_dimension() {
        for frames in [0usize, 1, 7, 480] {
            let stereo: Vec<f32> = (0..frames * 2).map(|i| (i % 5) as f32 * 0.1).collect();
            let mono = stereo_to_mono(&stereo, 2);
            assert_eq!(mono.len(), frames);
        }
    }

    #[test]
    fn stereo_to_mono_averages_frames() {
        let mono = stereo_to_mono(&[1.0, -1.0, 0.5, 0.5], 2);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_mono_and_zero_channels() {
        assert_eq!(stereo_to_mono(&[0.1, 0.2], 1), vec![0.1, 0.2]);
        assert!(stereo_to_mono(&[0.1, 0.2], 0).is_empty());
    }

    #[test]
    fn from_raw_downmixes_to_frame_count() {
        let raw = RawAudio::new(vec![0.2; 2 * 1_000], 2, 16_000);
        let wav = Waveform::from_raw(&raw);
        assert_eq!(wav.len(), raw.frames());
        assert_eq!(wav.sample_rate, 16_000);
    }

    #[test]
    fn from_pcm16_scales_to_unit_range() {
        let raw = RawAudio::from_pcm16(&[i16::MIN, 0, 16_384], 1, 8_000);
        assert!((raw.samples[0] + 1.0).abs() < 1e-6);
        assert_eq!(raw.samples[1], 0.0);
        assert!((raw.samples[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn peak_normalize_only_when_above_unit() {
        let mut loud = Waveform::new(vec![2.0, -4.0, 1.0], 16_000);
        assert!(loud.peak_normalize());
        assert!((loud.peak() - 1.0).abs() < 1e-6);
        assert!((loud.samples[0] - 0.5).abs() < 1e-6);

        let mut quiet = Waveform::new(vec![0.5, -1.0], 16_000);
        assert!(!quiet.peak_normalize());
        assert_eq!(quiet.samples, vec![0.5, -1.0]);
    }

    #[test]
    fn durations() {
        let raw = RawAudio::new(vec![0.0; 48_000], 2, 24_000);
        assert!((raw.duration_secs() - 1.0).abs() < 1e-6);
        assert!(RawAudio::new(vec![], 1, 16_000).is_empty());
        assert_eq!(Waveform::new(vec![0.0; 10], 0).duration_secs(), 0.0);
    }
}
