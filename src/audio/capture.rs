//! Microphone recording via `cpal`.
//!
//! [`Recorder::start`] opens the default input device and appends every
//! callback buffer to a shared sample vector.  [`Recorder::finish`] drops the
//! stream and hands back the take as [`RawAudio`] at the device's native
//! rate and channel count; downmixing and resampling happen downstream.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::RawAudio;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the input stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported input sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// An in-progress microphone recording.
///
/// Holds the cpal stream; dropping the recorder stops capture.  Samples past
/// `max_secs` are discarded so a forgotten recording cannot grow unbounded.
///
/// ```rust,no_run
/// use vallex_studio::audio::Recorder;
///
/// let rec = Recorder::start(30.0).unwrap();
/// std::thread::sleep(std::time::Duration::from_secs(3));
/// let audio = rec.finish();
/// println!("{} frames @ {} Hz", audio.frames(), audio.sample_rate);
/// ```
pub struct Recorder {
    _stream: cpal::Stream,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
}

impl Recorder {
    /// Start recording from the system default input device.
    pub fn start(max_secs: f32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let format = supported.sample_format();
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let limit = (max_secs.max(0.0) * sample_rate as f32) as usize * channels as usize;
        let samples = Arc::new(Mutex::new(Vec::with_capacity(limit.min(1 << 22))));

        let on_error = |err: cpal::StreamError| {
            log::error!("capture: cpal stream error: {err}");
        };

        let stream = match format {
            cpal::SampleFormat::F32 => {
                let sink = Arc::clone(&samples);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        append_limited(&sink, data.iter().copied(), limit);
                    },
                    on_error,
                    None,
                )?
            }
            cpal::SampleFormat::I16 => {
                let sink = Arc::clone(&samples);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        append_limited(
                            &sink,
                            data.iter().map(|&s| s as f32 / 32_768.0),
                            limit,
                        );
                    },
                    on_error,
                    None,
                )?
            }
            other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}"))),
        };

        stream.play()?;
        log::info!("capture: recording started ({sample_rate} Hz, {channels} ch)");

        Ok(Self {
            _stream: stream,
            samples,
            sample_rate,
            channels,
        })
    }

    /// Seconds captured so far.
    pub fn elapsed_secs(&self) -> f32 {
        let len = self.samples.lock().map(|s| s.len()).unwrap_or(0);
        len as f32 / (self.sample_rate as f32 * self.channels.max(1) as f32)
    }

    /// Stop the stream and return everything captured.
    pub fn finish(self) -> RawAudio {
        let Recorder {
            _stream,
            samples,
            sample_rate,
            channels,
        } = self;
        drop(_stream);

        let samples = match samples.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        log::info!(
            "capture: recording stopped ({} samples, {channels} ch)",
            samples.len()
        );
        RawAudio::new(samples, channels, sample_rate)
    }
}

fn append_limited(sink: &Mutex<Vec<f32>>, data: impl Iterator<Item = f32>, limit: usize) {
    // The audio thread must never panic; a poisoned lock just drops the chunk.
    if let Ok(mut buf) = sink.lock() {
        let room = limit.saturating_sub(buf.len());
        buf.extend(data.take(room));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_stops_at_limit() {
        let sink = Mutex::new(Vec::new());
        append_limited(&sink, [0.1_f32; 6].into_iter(), 4);
        append_limited(&sink, [0.2_f32; 6].into_iter(), 4);
        assert_eq!(sink.lock().unwrap().len(), 4);
    }

    #[test]
    fn append_keeps_head_of_recording() {
        let sink = Mutex::new(vec![1.0_f32]);
        append_limited(&sink, [2.0_f32, 3.0, 4.0].into_iter(), 3);
        assert_eq!(*sink.lock().unwrap(), vec![1.0, 2.0, 3.0]);
    }
}
