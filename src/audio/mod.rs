//! Audio plumbing: WAV files, microphone capture, playback and resampling.
//!
//! # Pipeline
//!
//! ```text
//! WAV upload (hound) ─┐
//!                     ├─▶ RawAudio ─▶ Waveform::from_raw (downmix) ─▶ peak_normalize
//! Microphone (cpal) ──┘                         │
//!                                               ├─▶ resample → 16 kHz → Whisper
//!                                               └─▶ resample → codec rate → Encodec
//!
//! decoded Waveform (24 kHz) ─▶ write_wav (outputs/) + Playback (cpal)
//! ```

pub mod capture;
pub mod error;
pub mod playback;
pub mod resample;
pub mod wav;
pub mod waveform;

pub use capture::{CaptureError, Recorder};
pub use error::AudioError;
pub use playback::{Playback, PlaybackError};
pub use resample::resample;
pub use wav::{read_wav, write_wav};
pub use waveform::{stereo_to_mono, RawAudio, Waveform};
