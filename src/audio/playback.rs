//! Output-device playback via `cpal`.
//!
//! [`Playback::play`] resamples a [`Waveform`] to the default output device's
//! rate, duplicates it across the device's channels and streams it out.  The
//! returned handle keeps the stream alive; drop it to stop early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::{resample, AudioError, Waveform};

/// Errors that can occur while starting playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to query default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("output device wants {0}; only f32 and i16 output are supported")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// A waveform that is currently playing.
pub struct Playback {
    _stream: cpal::Stream,
    cursor: Arc<AtomicUsize>,
    total: usize,
}

impl Playback {
    /// Start playing `waveform` on the default output device.
    pub fn play(waveform: &Waveform) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let supported = device.default_output_config()?;
        let format = supported.sample_format();
        let channels = supported.channels().max(1) as usize;
        let rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let samples = Arc::new(resample(&waveform.samples, waveform.sample_rate, rate)?);
        let total = samples.len();
        let cursor = Arc::new(AtomicUsize::new(0));

        let on_error = |err: cpal::StreamError| log::error!("playback: cpal stream error: {err}");
        let stream = match format {
            cpal::SampleFormat::F32 => {
                let samples = Arc::clone(&samples);
                let cursor = Arc::clone(&cursor);
                device.build_output_stream(
                    &config,
                    move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        fill_frames(out, channels, &samples, &cursor, |s| s);
                    },
                    on_error,
                    None,
                )?
            }
            cpal::SampleFormat::I16 => {
                let samples = Arc::clone(&samples);
                let cursor = Arc::clone(&cursor);
                device.build_output_stream(
                    &config,
                    move |out: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        fill_frames(out, channels, &samples, &cursor, to_i16);
                    },
                    on_error,
                    None,
                )?
            }
            other => return Err(PlaybackError::UnsupportedFormat(format!("{other:?}"))),
        };
        stream.play()?;
        log::debug!("playback: {total} samples @ {rate} Hz, {channels} ch");

        Ok(Self {
            _stream: stream,
            cursor,
            total,
        })
    }

    /// `true` once every sample has been handed to the device.
    pub fn is_finished(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.total
    }
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Copy the next mono samples into an interleaved output buffer, padding
/// with silence once the source runs out.
fn fill_frames<T: Copy>(
    out: &mut [T],
    channels: usize,
    src: &[f32],
    cursor: &AtomicUsize,
    convert: impl Fn(f32) -> T,
) {
    let mut pos = cursor.load(Ordering::Relaxed);
    for frame in out.chunks_mut(channels) {
        let s = convert(src.get(pos).copied().unwrap_or(0.0));
        frame.fill(s);
        pos += 1;
    }
    cursor.store(pos.min(src.len()), Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_duplicates_across_channels_and_pads() {
        let src = [0.1_f32, 0.2, 0.3];
        let cursor = AtomicUsize::new(0);

        let mut out = [9.0_f32; 4];
        fill_frames(&mut out, 2, &src, &cursor, |s| s);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
        assert_eq!(cursor.load(Ordering::Relaxed), 2);

        let mut out = [9.0_f32; 4];
        fill_frames(&mut out, 2, &src, &cursor, |s| s);
        assert_eq!(out, [0.3, 0.3, 0.0, 0.0]);
        assert_eq!(cursor.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn i16_output_is_scaled_and_clamped() {
        let src = [1.0_f32, -1.0, 0.5, 2.0];
        let cursor = AtomicUsize::new(0);

        let mut out = [7_i16; 5];
        fill_frames(&mut out, 1, &src, &cursor, to_i16);
        assert_eq!(out, [i16::MAX, -i16::MAX, 16_383, i16::MAX, 0]);
        assert_eq!(cursor.load(Ordering::Relaxed), 4);
    }
}
