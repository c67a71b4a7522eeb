//! Whisper parameter and result types.
//!
//! [`TranscribeParams`] carries everything that controls one inference run;
//! [`TranscriptionResult`] is what [`SpeechRecognizer::recognize`] returns.
//!
//! [`SpeechRecognizer::recognize`]: crate::stt::SpeechRecognizer::recognize

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Owned, `Clone` mirror of `whisper_rs::SamplingStrategy`.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    Greedy {
        best_of: i32,
    },
    BeamSearch {
        beam_size: i32,
        /// Patience factor; negative selects whisper.cpp's default.
        patience: f32,
    },
}

impl SamplingStrategy {
    /// Beam search with `beam_size` beams and default patience.
    pub fn beam(beam_size: i32) -> Self {
        Self::BeamSearch {
            beam_size,
            patience: -1.0,
        }
    }
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::beam(5)
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Parameters for a single Whisper run.
///
/// The default auto-detects the language and decodes with a 5-beam search:
///
/// ```
/// use vallex_studio::stt::{SamplingStrategy, TranscribeParams};
///
/// let params = TranscribeParams {
///     strategy: SamplingStrategy::beam(3),
///     ..TranscribeParams::default()
/// };
/// assert_eq!(params.language, "auto");
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 code, or `"auto"` for detection.
    pub language: String,

    pub strategy: SamplingStrategy,

    /// CPU threads handed to Whisper.  Defaults to [`optimal_threads()`].
    pub n_threads: i32,

    /// Suppress Whisper's progress output on stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "auto".into(),
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

/// Available parallelism capped at 8; Whisper gains little past that.
pub fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Output of a successful recognition pass.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Concatenated segment text, trimmed.
    pub text: String,

    /// Detected (or forced) ISO-639-1 language code.
    pub language: String,

    pub segments: Vec<Segment>,

    /// Wall-clock inference time.
    pub duration_ms: u128,
}

/// A time-aligned chunk of the transcript.
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}
