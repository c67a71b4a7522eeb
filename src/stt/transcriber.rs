//! File-level transcription: WAV path in, `(language, text)` out.
//!
//! The recognizer only sees 16 kHz mono audio padded or trimmed to exactly
//! one 30-second Whisper window.  The transcript always ends in one of
//! [`TERMINATORS`] so it can be concatenated with the target text.

use std::path::Path;
use std::sync::Arc;

use crate::audio::{read_wav, resample, Waveform};
use crate::stt::{SpeechRecognizer, SttError};

/// Sample rate Whisper expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// One Whisper window: 30 s at 16 kHz.
pub const WHISPER_WINDOW_SAMPLES: usize = 30 * WHISPER_SAMPLE_RATE as usize;

/// Characters accepted as the end of a transcript.
pub const TERMINATORS: [char; 9] = ['?', '!', '.', ',', '。', '，', '？', '！', '、'];

/// Append `.` unless `text` already ends (ignoring trailing space) with a
/// terminator.  The result is trimmed.
pub fn ensure_terminal_punctuation(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.chars().last() {
        Some(c) if TERMINATORS.contains(&c) => trimmed.to_string(),
        _ => format!("{trimmed}."),
    }
}

/// Zero-pad or truncate to exactly `len` samples.
pub fn pad_or_trim(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}

/// Output of [`Transcriber::transcribe_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// ISO-639-1 code reported by Whisper.
    pub language: String,
    pub text: String,
}

/// Reads reference audio and runs it through a [`SpeechRecognizer`].
#[derive(Clone)]
pub struct Transcriber {
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl Transcriber {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        Self { recognizer }
    }

    /// The underlying recognizer, for placement by the caller.
    pub fn recognizer(&self) -> &dyn SpeechRecognizer {
        self.recognizer.as_ref()
    }

    /// Transcribe the WAV file at `path`.
    ///
    /// # Errors
    ///
    /// [`SttError::Audio`] when the file cannot be read or resampled,
    /// [`SttError::EmptyTranscript`] when Whisper hears nothing, and any
    /// recognizer error unchanged.
    pub fn transcribe_file(&self, path: impl AsRef<Path>) -> Result<Transcript, SttError> {
        let path = path.as_ref();
        let raw = read_wav(path).map_err(|e| SttError::Audio(e.to_string()))?;
        let mono = Waveform::from_raw(&raw);
        let audio = resample(&mono.samples, mono.sample_rate, WHISPER_SAMPLE_RATE)
            .map_err(|e| SttError::Audio(e.to_string()))?;
        if audio.is_empty() {
            return Err(SttError::EmptyAudio);
        }
        let audio = pad_or_trim(audio, WHISPER_WINDOW_SAMPLES);

        let result = self.recognizer.recognize(&audio)?;
        if result.text.trim().is_empty() {
            return Err(SttError::EmptyTranscript);
        }

        let text = ensure_terminal_punctuation(&result.text);
        log::info!("stt: {} → [{}] {text}", path.display(), result.language);
        Ok(Transcript {
            language: result.language,
            text,
        })
    }
}
