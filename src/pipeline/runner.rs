//! Pipeline orchestrator: runs UI requests against the [`Synthesizer`].
//!
//! [`PipelineOrchestrator`] owns the write side of [`SharedState`] and
//! responds to [`PipelineCommand`]s received over a `tokio::sync::mpsc`
//! channel, one at a time, in arrival order.
//!
//! # Pipeline flow
//!
//! ```text
//! PipelineCommand::InferFromAudio
//!   └─▶ read upload / take recording ─▶ spawn_blocking(infer_from_audio)  [Synthesizing]
//!         └─▶ save <outputs>/<timestamp>.wav                              [Done]
//!
//! PipelineCommand::MakePrompt
//!   └─▶ spawn_blocking(make_npz_prompt)                                   [Packaging]
//!         └─▶ remember archive path                                       [Done]
//!
//! PipelineCommand::InferFromPrompt
//!   └─▶ spawn_blocking(infer_from_prompt) ─▶ save output                  [Synthesizing → Done]
//! ```
//!
//! Every failure lands in [`PipelineState::Error`] with a message; the loop
//! keeps serving the next command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audio::{read_wav, write_wav, RawAudio, Waveform};
use crate::error::VoiceError;
use crate::lang::{Accent, LanguageChoice};
use crate::synthesis::{Synthesis, Synthesizer};

use super::state::{PipelineState, SharedState};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Reference audio as the UI collected it: an uploaded WAV path, a
/// microphone recording, or both.
#[derive(Debug, Clone, Default)]
pub struct PromptSource {
    pub uploaded: Option<PathBuf>,
    pub recorded: Option<RawAudio>,
}

impl PromptSource {
    /// Read the upload (if any) and return both sources.
    fn load(self) -> Result<(Option<RawAudio>, Option<RawAudio>), VoiceError> {
        let uploaded = match self.uploaded {
            Some(path) => Some(read_wav(path)?),
            None => None,
        };
        Ok((uploaded, self.recorded))
    }

    /// The upload wins over the recording unless it is empty.
    fn resolve(self) -> Result<RawAudio, VoiceError> {
        let (uploaded, recorded) = self.load()?;
        uploaded
            .filter(|a| !a.is_empty())
            .or(recorded.filter(|a| !a.is_empty()))
            .ok_or(VoiceError::NoAudio)
    }
}

/// One request from the UI.
#[derive(Debug, Clone)]
pub enum PipelineCommand {
    InferFromAudio {
        text: String,
        language: LanguageChoice,
        accent: Accent,
        source: PromptSource,
    },
    MakePrompt {
        name: String,
        source: PromptSource,
    },
    InferFromPrompt {
        text: String,
        language: LanguageChoice,
        accent: Accent,
        archive: PathBuf,
    },
}

impl PipelineCommand {
    fn phase(&self) -> PipelineState {
        match self {
            PipelineCommand::MakePrompt { .. } => PipelineState::Packaging,
            PipelineCommand::InferFromAudio { .. } | PipelineCommand::InferFromPrompt { .. } => {
                PipelineState::Synthesizing
            }
        }
    }
}

enum Outcome {
    Speech {
        synthesis: Synthesis,
        saved: Option<PathBuf>,
    },
    Prompt {
        message: String,
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Packaging or synthesis failed.
    Voice(VoiceError),
    /// The blocking worker panicked or was cancelled.
    Internal(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Voice(e) => write!(f, "{e}"),
            PipelineError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<VoiceError> for PipelineError {
    fn from(e: VoiceError) -> Self {
        PipelineError::Voice(e)
    }
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Serialises UI requests onto the blocking thread pool.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use vallex_studio::config::AppConfig;
/// use vallex_studio::pipeline::{new_shared_state, PipelineOrchestrator};
/// # use vallex_studio::synthesis::Synthesizer;
/// # fn make_synthesizer() -> Arc<Synthesizer> { unimplemented!() }
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let shared_state = new_shared_state(config.clone());
///
/// let (tx, rx) = tokio::sync::mpsc::channel(8);
/// let orchestrator =
///     PipelineOrchestrator::new(shared_state, make_synthesizer(), config.ui.outputs_dir);
/// tokio::spawn(orchestrator.run(rx));
/// # drop(tx);
/// # }
/// ```
pub struct PipelineOrchestrator {
    state: SharedState,
    synthesizer: Arc<Synthesizer>,
    outputs_dir: PathBuf,
}

impl PipelineOrchestrator {
    pub fn new(
        state: SharedState,
        synthesizer: Arc<Synthesizer>,
        outputs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            state,
            synthesizer,
            outputs_dir: outputs_dir.into(),
        }
    }

    /// Run until every sender of `commands` is dropped.
    pub async fn run(self, mut commands: mpsc::Receiver<PipelineCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }
        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    async fn handle(&self, command: PipelineCommand) {
        let phase = command.phase();
        log::debug!("pipeline: → {}", phase.label());
        {
            let mut st = self.state.lock().unwrap();
            st.pipeline = phase;
            st.error_message = None;
        }

        let synthesizer = Arc::clone(&self.synthesizer);
        let outputs_dir = self.outputs_dir.clone();
        let result =
            tokio::task::spawn_blocking(move || execute(&synthesizer, &outputs_dir, command))
                .await;

        match result {
            Ok(Ok(outcome)) => self.finish(outcome),
            Ok(Err(e)) => self.set_error(PipelineError::Voice(e).to_string()),
            Err(e) => self.set_error(PipelineError::Internal(e.to_string()).to_string()),
        }
    }

    fn finish(&self, outcome: Outcome) {
        let mut st = self.state.lock().unwrap();
        match outcome {
            Outcome::Speech { synthesis, saved } => {
                st.message = Some(synthesis.message);
                st.last_waveform = Some(synthesis.waveform);
                st.last_output = saved;
            }
            Outcome::Prompt { message, path } => {
                st.message = Some(message);
                st.last_prompt = Some(path);
            }
        }
        st.pipeline = PipelineState::Done;
    }

    fn set_error(&self, message: String) {
        let mut st = self.state.lock().unwrap();
        st.pipeline = PipelineState::Error;
        st.error_message = Some(message.clone());
        log::error!("pipeline error: {message}");
    }
}

fn execute(
    synthesizer: &Synthesizer,
    outputs_dir: &Path,
    command: PipelineCommand,
) -> Result<Outcome, VoiceError> {
    match command {
        PipelineCommand::InferFromAudio {
            text,
            language,
            accent,
            source,
        } => {
            let audio = source.resolve()?;
            let synthesis = synthesizer.infer_from_audio(&text, language, accent, &audio)?;
            let saved = save_output(outputs_dir, &synthesis.waveform);
            Ok(Outcome::Speech { synthesis, saved })
        }
        PipelineCommand::MakePrompt { name, source } => {
            let (uploaded, recorded) = source.load()?;
            let (message, path) = synthesizer.packager().make_npz_prompt(
                &name,
                uploaded.as_ref(),
                recorded.as_ref(),
            )?;
            Ok(Outcome::Prompt { message, path })
        }
        PipelineCommand::InferFromPrompt {
            text,
            language,
            accent,
            archive,
        } => {
            let synthesis = synthesizer.infer_from_prompt(&text, language, accent, &archive)?;
            let saved = save_output(outputs_dir, &synthesis.waveform);
            Ok(Outcome::Speech { synthesis, saved })
        }
    }
}

/// Write `<outputs_dir>/<timestamp>.wav`.  A failed save is logged and the
/// synthesis is still reported, only without a file.
fn save_output(outputs_dir: &Path, waveform: &Waveform) -> Option<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    let path = outputs_dir.join(format!("{stamp}.wav"));
    let saved = std::fs::create_dir_all(outputs_dir)
        .map_err(VoiceError::from)
        .and_then(|_| write_wav(&path, waveform).map_err(VoiceError::from));
    match saved {
        Ok(()) => {
            log::info!("pipeline: saved {}", path.display());
            Some(path)
        }
        Err(e) => {
            log::warn!("pipeline: could not save output to {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::model::mock::{MockAcousticModel, MOCK_HOP};
    use crate::pipeline::state::new_shared_state;
    use crate::stt::MockRecognizer;
    use crate::test_support::{synthesizer_with, tone};
    use tempfile::TempDir;

    fn recording() -> RawAudio {
        RawAudio::new(vec![0.25; 16_000], 1, 16_000)
    }

    fn make_orchestrator(
        recognizer: MockRecognizer,
        model: MockAcousticModel,
    ) -> (TempDir, PipelineOrchestrator, SharedState) {
        let (dir, synth, _) = synthesizer_with(recognizer, model);
        let state = new_shared_state(AppConfig::default());
        let orc = PipelineOrchestrator::new(
            Arc::clone(&state),
            Arc::new(synth),
            dir.path().join("outputs"),
        );
        (dir, orc, state)
    }

    fn speak(text: &str, source: PromptSource) -> PipelineCommand {
        PipelineCommand::InferFromAudio {
            text: text.into(),
            language: LanguageChoice::English,
            accent: Accent::NoAccent,
            source,
        }
    }

    #[tokio::test]
    async fn infer_from_recording_reaches_done_and_saves_output() {
        let (dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("hi", "en"), MockAcousticModel::new(10));
        let (tx, rx) = mpsc::channel(4);

        let source = PromptSource {
            uploaded: None,
            recorded: Some(recording()),
        };
        tx.send(speak("hello", source)).await.unwrap();
        drop(tx);
        orc.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Done);
        assert!(st.error_message.is_none());
        assert_eq!(st.last_waveform.as_ref().unwrap().len(), 10 * MOCK_HOP);
        assert!(st.message.as_ref().unwrap().contains("[EN]hello[EN]"));

        let saved = st.last_output.as_ref().unwrap();
        assert!(saved.starts_with(dir.path().join("outputs")));
        assert!(saved.exists());
    }

    #[tokio::test]
    async fn uploaded_wav_is_read() {
        let (dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("hi", "en"), MockAcousticModel::new(5));
        let wav = dir.path().join("upload.wav");
        write_wav(&wav, &tone(0.5, 16_000)).unwrap();

        let (tx, rx) = mpsc::channel(4);
        let source = PromptSource {
            uploaded: Some(wav),
            recorded: None,
        };
        tx.send(speak("hello", source)).await.unwrap();
        drop(tx);
        orc.run(rx).await;

        assert_eq!(state.lock().unwrap().pipeline, PipelineState::Done);
    }

    #[tokio::test]
    async fn missing_audio_sets_error_state() {
        let (_dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("hi", "en"), MockAcousticModel::new(5));
        let (tx, rx) = mpsc::channel(4);

        tx.send(speak("hello", PromptSource::default())).await.unwrap();
        drop(tx);
        orc.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.error_message.as_ref().unwrap().contains("no reference audio"));
        assert!(st.last_waveform.is_none());
    }

    #[tokio::test]
    async fn make_prompt_then_infer_from_prompt() {
        let (dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("你好", "zh"), MockAcousticModel::new(8));
        let archive = dir.path().join("scratch").join("speaker.npz");
        let (tx, rx) = mpsc::channel(4);

        tx.send(PipelineCommand::MakePrompt {
            name: "speaker".into(),
            source: PromptSource {
                uploaded: None,
                recorded: Some(recording()),
            },
        })
        .await
        .unwrap();
        tx.send(PipelineCommand::InferFromPrompt {
            text: "hello".into(),
            language: LanguageChoice::English,
            accent: Accent::NoAccent,
            archive: archive.clone(),
        })
        .await
        .unwrap();
        drop(tx);
        orc.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Done);
        assert_eq!(st.last_prompt.as_deref(), Some(archive.as_path()));
        assert!(archive.exists());
        assert_eq!(st.message.as_deref(), Some("synthesized text: [EN]hello[EN]"));
        assert_eq!(st.last_waveform.as_ref().unwrap().len(), 8 * MOCK_HOP);
    }

    #[tokio::test]
    async fn make_prompt_reports_detected_language() {
        let (_dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("你好", "zh"), MockAcousticModel::new(8));
        let (tx, rx) = mpsc::channel(4);

        tx.send(PipelineCommand::MakePrompt {
            name: "speaker".into(),
            source: PromptSource {
                uploaded: None,
                recorded: Some(recording()),
            },
        })
        .await
        .unwrap();
        drop(tx);
        orc.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Done);
        assert!(st.message.as_ref().unwrap().contains("Detected language: zh"));
        assert!(st.last_waveform.is_none());
    }

    #[tokio::test]
    async fn model_failure_sets_error_then_recovers() {
        let (_dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("hi", "en"), MockAcousticModel::failing());
        let (tx, rx) = mpsc::channel(4);

        let source = PromptSource {
            uploaded: None,
            recorded: Some(recording()),
        };
        tx.send(speak("a", source.clone())).await.unwrap();
        tx.send(PipelineCommand::MakePrompt {
            name: "p".into(),
            source,
        })
        .await
        .unwrap();
        drop(tx);
        orc.run(rx).await;

        // The failed synthesis does not stop the packaging that follows.
        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Done);
        assert!(st.error_message.is_none());
        assert!(st.last_prompt.is_some());
        assert!(st.last_waveform.is_none());
    }

    #[tokio::test]
    async fn invalid_prompt_name_sets_error() {
        let (_dir, orc, state) =
            make_orchestrator(MockRecognizer::ok("hi", "en"), MockAcousticModel::new(5));
        let (tx, rx) = mpsc::channel(4);

        tx.send(PipelineCommand::MakePrompt {
            name: "../escape".into(),
            source: PromptSource {
                uploaded: None,
                recorded: Some(recording()),
            },
        })
        .await
        .unwrap();
        drop(tx);
        orc.run(rx).await;

        let st = state.lock().unwrap();
        assert_eq!(st.pipeline, PipelineState::Error);
        assert!(st.last_prompt.is_none());
    }

    #[test]
    fn upload_preferred_over_recording_unless_empty() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("u.wav");
        write_wav(&wav, &tone(0.25, 8_000)).unwrap();

        let both = PromptSource {
            uploaded: Some(wav),
            recorded: Some(recording()),
        };
        assert_eq!(both.resolve().unwrap().sample_rate, 8_000);

        let empty_upload = dir.path().join("empty.wav");
        write_wav(&empty_upload, &Waveform::new(Vec::new(), 8_000)).unwrap();
        let fallback = PromptSource {
            uploaded: Some(empty_upload),
            recorded: Some(recording()),
        };
        assert_eq!(fallback.resolve().unwrap().sample_rate, 16_000);
    }
}
