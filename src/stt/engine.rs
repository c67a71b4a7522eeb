//! Speech-recognizer trait and the whisper-rs implementation.
//!
//! [`SpeechRecognizer`] is what the prompt packager talks to.  It is
//! object-safe and `Send + Sync` so it can live behind an
//! `Arc<dyn SpeechRecognizer>`, and it extends [`Placeable`] so the packager
//! can move it onto the compute device for the duration of one call.
//!
//! [`WhisperEngine`] wraps a `whisper_rs::WhisperContext`.  whisper.cpp picks
//! CPU or GPU when the context is created, so placement is implemented by
//! (re)loading the context: `Active(Cuda(n))` loads onto GPU `n`, and
//! `Offloaded` drops a GPU context to free VRAM.  A CPU context is kept
//! across calls.
//!
//! [`MockRecognizer`] (`#[cfg(test)]`) returns a canned transcript and
//! records every placement it receives.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::model::{ComputeDevice, ModelError, Placeable, Placement};
use crate::stt::transcribe::{SamplingStrategy, Segment, TranscribeParams, TranscriptionResult};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The GGML model file was not found at the given path.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// whisper-rs failed to create a `WhisperContext` or `WhisperState`.
    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Audio buffer is empty")]
    EmptyAudio,

    #[error("Whisper reported an unknown language id {0}")]
    UnknownLanguage(i32),

    /// Reading or converting the reference audio failed.
    #[error("Reference audio: {0}")]
    Audio(String),

    #[error("Whisper produced an empty transcript")]
    EmptyTranscript,
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe speech-to-text interface.
///
/// `audio_16k` must be **16 kHz, mono, f32** PCM.
pub trait SpeechRecognizer: Placeable {
    fn recognize(&self, audio_16k: &[f32]) -> Result<TranscriptionResult, SttError>;
}

// Compile-time assertion: Box<dyn SpeechRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

struct LoadedContext {
    ctx: WhisperContext,
    device: ComputeDevice,
}

/// Production recognizer backed by whisper-rs.
pub struct WhisperEngine {
    model_path: PathBuf,
    params: TranscribeParams,
    loaded: Mutex<Option<LoadedContext>>,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("model_path", &self.model_path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; all access
// goes through the mutex.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model onto the CPU.
    ///
    /// The model is loaded eagerly so a bad path fails at start-up rather
    /// than on the first prompt.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] when `model_path` does not exist.
    /// - [`SttError::ContextInit`] when whisper-rs rejects the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.exists() {
            return Err(SttError::ModelNotFound(model_path.display().to_string()));
        }
        let ctx = load_context(&model_path, ComputeDevice::Cpu)?;
        log::info!("stt: loaded {}", model_path.display());

        Ok(Self {
            model_path,
            params,
            loaded: Mutex::new(Some(LoadedContext {
                ctx,
                device: ComputeDevice::Cpu,
            })),
        })
    }

    fn full_params(&self) -> FullParams<'_, '_> {
        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch {
                beam_size,
                patience,
            } => WS::BeamSearch {
                beam_size,
                patience,
            },
        };

        let mut fp = FullParams::new(ws);
        fp.set_language(Some(self.params.language.as_str()));
        fp.set_n_threads(self.params.n_threads);
        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
            fp.set_print_special(false);
            fp.set_print_timestamps(false);
        }
        fp
    }
}

fn load_context(path: &Path, device: ComputeDevice) -> Result<WhisperContext, SttError> {
    let path_str = path.to_str().ok_or_else(|| {
        SttError::ModelNotFound(format!(
            "model path contains non-UTF-8 characters: {}",
            path.display()
        ))
    })?;

    let mut ctx_params = WhisperContextParameters::default();
    match device {
        ComputeDevice::Cpu => {
            ctx_params.use_gpu = false;
        }
        ComputeDevice::Cuda(index) => {
            ctx_params.use_gpu = true;
            ctx_params.gpu_device = index as i32;
        }
    }

    WhisperContext::new_with_params(path_str, ctx_params)
        .map_err(|e| SttError::ContextInit(e.to_string()))
}

impl Placeable for WhisperEngine {
    fn place(&self, placement: Placement) -> Result<(), ModelError> {
        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| ModelError::Placement("whisper context lock poisoned".into()))?;

        match placement {
            Placement::Active(device) => {
                if loaded.as_ref().is_some_and(|l| l.device == device) {
                    return Ok(());
                }
                // Release the old context before allocating the new one.
                *loaded = None;
                let ctx = load_context(&self.model_path, device)
                    .map_err(|e| ModelError::Placement(e.to_string()))?;
                log::debug!("stt: whisper context on {device}");
                *loaded = Some(LoadedContext { ctx, device });
            }
            Placement::Offloaded => {
                if loaded
                    .as_ref()
                    .is_some_and(|l| l.device != ComputeDevice::Cpu)
                {
                    *loaded = None;
                    log::debug!("stt: whisper context released");
                }
            }
        }
        Ok(())
    }
}

impl SpeechRecognizer for WhisperEngine {
    fn recognize(&self, audio_16k: &[f32]) -> Result<TranscriptionResult, SttError> {
        if audio_16k.is_empty() {
            return Err(SttError::EmptyAudio);
        }

        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| SttError::ContextInit("whisper context lock poisoned".into()))?;
        if loaded.is_none() {
            let ctx = load_context(&self.model_path, ComputeDevice::Cpu)?;
            *loaded = Some(LoadedContext {
                ctx,
                device: ComputeDevice::Cpu,
            });
        }
        let Some(current) = loaded.as_ref() else {
            return Err(SttError::ContextInit("whisper context unavailable".into()));
        };

        let mut state = current
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let wall_start = std::time::Instant::now();
        state
            .full(self.full_params(), audio_16k)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let lang_id = state
            .full_lang_id_from_state()
            .map_err(|e| SttError::Transcription(e.to_string()))?;
        let language = whisper_rs::get_lang_str(lang_id)
            .ok_or(SttError::UnknownLanguage(lang_id))?
            .to_string();

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        for i in 0..n_segments {
            let seg_text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            text.push_str(&seg_text);
            segments.push(Segment {
                text: seg_text,
                start_ms: t0,
                end_ms: t1,
            });
        }

        let result = TranscriptionResult {
            text: text.trim().to_string(),
            language,
            segments,
            duration_ms: wall_start.elapsed().as_millis(),
        };
        log::debug!(
            "stt: {} segment(s), language={}, {} ms",
            result.segments.len(),
            result.language,
            result.duration_ms
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double that returns a canned transcript without a model file.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<(String, String), SttError>,
    placements: Mutex<Vec<Placement>>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Always recognise `text` in `language` (ISO code).
    pub fn ok(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            response: Ok((text.into(), language.into())),
            placements: Mutex::new(Vec::new()),
        }
    }

    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            placements: Mutex::new(Vec::new()),
        }
    }

    pub fn placements(&self) -> Vec<Placement> {
        self.placements.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Placeable for MockRecognizer {
    fn place(&self, placement: Placement) -> Result<(), ModelError> {
        self.placements.lock().unwrap().push(placement);
        Ok(())
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn recognize(&self, audio_16k: &[f32]) -> Result<TranscriptionResult, SttError> {
        if audio_16k.is_empty() {
            return Err(SttError::EmptyAudio);
        }
        let (text, language) = self.response.clone()?;
        Ok(TranscriptionResult {
            text,
            language,
            segments: Vec::new(),
            duration_ms: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ok_returns_configured_text_and_language() {
        let engine = MockRecognizer::ok("你好", "zh");
        let r = engine.recognize(&[0.0; 16]).unwrap();
        assert_eq!(r.text, "你好");
        assert_eq!(r.language, "zh");
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let engine = MockRecognizer::err(SttError::Transcription("boom".into()));
        assert!(matches!(
            engine.recognize(&[0.0; 16]),
            Err(SttError::Transcription(_))
        ));
    }

    #[test]
    fn empty_audio_is_rejected() {
        let engine = MockRecognizer::ok("x", "en");
        assert!(matches!(engine.recognize(&[]), Err(SttError::EmptyAudio)));
    }

    #[test]
    fn mock_records_placements() {
        let engine = MockRecognizer::ok("x", "en");
        engine.place(Placement::Active(ComputeDevice::Cuda(0))).unwrap();
        engine.place(Placement::Offloaded).unwrap();
        assert_eq!(
            engine.placements(),
            vec![
                Placement::Active(ComputeDevice::Cuda(0)),
                Placement::Offloaded
            ]
        );
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperEngine::load("/nonexistent/model.bin", TranscribeParams::default());
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn box_dyn_recognizer_compiles() {
        let engine: Box<dyn SpeechRecognizer> = Box::new(MockRecognizer::ok("ok", "en"));
        let _ = engine.recognize(&[0.0; 16]);
    }

    #[test]
    fn stt_error_display_model_not_found() {
        let e = SttError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }
}
