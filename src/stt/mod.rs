//! Speech recognition for reference audio.
//!
//! # Architecture
//!
//! ```text
//!   WAV path ──▶ Transcriber ──▶ read · downmix · 16 kHz · 30 s window
//!                     │
//!                     ▼
//!          Arc<dyn SpeechRecognizer>  (WhisperEngine | MockRecognizer)
//!                     │
//!                     ▼
//!       Transcript { language: "zh" | "ja" | "en" | …, text: "…." }
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vallex_studio::stt::{TranscribeParams, Transcriber, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-medium.bin", TranscribeParams::default())
//!     .expect("model not found");
//! let transcriber = Transcriber::new(Arc::new(engine));
//! let t = transcriber.transcribe_file("prompts/prompt_1.wav").unwrap();
//! println!("[{}] {}", t.language, t.text);
//! ```

pub mod engine;
pub mod model;
pub mod transcribe;
pub mod transcriber;

pub use engine::{SpeechRecognizer, SttError, WhisperEngine};
pub use model::{find_model_by_id, ModelInfo, ModelPaths, ModelSize, WHISPER_MODELS};
pub use transcribe::{
    optimal_threads, SamplingStrategy, Segment, TranscribeParams, TranscriptionResult,
};
pub use transcriber::{
    ensure_terminal_punctuation, Transcriber, Transcript, TERMINATORS, WHISPER_SAMPLE_RATE,
};

#[cfg(test)]
pub use engine::MockRecognizer;
