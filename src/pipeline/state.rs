//! Pipeline phase and shared application state.
//!
//! [`AppState`] is the single source of truth the UI renders each frame;
//! the orchestrator is its only writer apart from the config snapshot.
//! [`SharedState`] is `Arc<Mutex<AppState>>`, cheap to clone and safe to
//! share across threads.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::audio::Waveform;
use crate::config::AppConfig;

/// Phases of a single UI request.
///
/// ```text
/// Idle ──make prompt──▶ Packaging ──▶ Done
///      ──synthesize───▶ Synthesizing ──▶ Done
/// any state ──error──▶ Error
/// Done / Error ──next command──▶ Packaging | Synthesizing
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PipelineState {
    #[default]
    Idle,

    /// Transcribing reference audio and writing a prompt archive.
    Packaging,

    /// Prompt preparation, acoustic model inference and decoding.
    Synthesizing,

    /// The last request finished; its outputs are in [`AppState`].
    Done,

    /// The last request failed; see [`AppState::error_message`].
    Error,
}

impl PipelineState {
    /// `true` while a request is running.  The UI disables its action
    /// buttons meanwhile.
    ///
    /// ```
    /// use vallex_studio::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Packaging.is_busy());
    /// assert!(PipelineState::Synthesizing.is_busy());
    /// assert!(!PipelineState::Done.is_busy());
    /// assert!(!PipelineState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Packaging | PipelineState::Synthesizing)
    }

    /// Short label for the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Packaging => "Making prompt",
            PipelineState::Synthesizing => "Synthesizing",
            PipelineState::Done => "Done",
            PipelineState::Error => "Error",
        }
    }
}

/// Everything the UI needs to render.
pub struct AppState {
    pub pipeline: PipelineState,

    /// Status text from the last successful request.
    pub message: Option<String>,

    /// Shown when `pipeline == PipelineState::Error`.
    pub error_message: Option<String>,

    /// Latest synthesized speech, for playback.
    pub last_waveform: Option<Waveform>,

    /// Where the latest synthesized speech was saved.
    pub last_output: Option<PathBuf>,

    /// Latest prompt archive written by "Make prompt".
    pub last_prompt: Option<PathBuf>,

    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: PipelineState::Idle,
            message: None,
            error_message: None,
            last_waveform: None,
            last_output: None,
            last_prompt: None,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Thread-safe handle to [`AppState`].
///
/// Lock for a short critical section only; never hold it across `.await`.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_states() {
        assert!(!PipelineState::Idle.is_busy());
        assert!(PipelineState::Packaging.is_busy());
        assert!(PipelineState::Synthesizing.is_busy());
        assert!(!PipelineState::Done.is_busy());
        assert!(!PipelineState::Error.is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(PipelineState::Idle.label(), "Idle");
        assert_eq!(PipelineState::Packaging.label(), "Making prompt");
        assert_eq!(PipelineState::Synthesizing.label(), "Synthesizing");
        assert_eq!(PipelineState::Done.label(), "Done");
        assert_eq!(PipelineState::Error.label(), "Error");
    }

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = AppState::default();
        assert_eq!(state.pipeline, PipelineState::Idle);
        assert!(state.message.is_none());
        assert!(state.error_message.is_none());
        assert!(state.last_waveform.is_none());
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state(AppConfig::default());
        let state2 = Arc::clone(&state);

        state.lock().unwrap().pipeline = PipelineState::Synthesizing;
        assert_eq!(state2.lock().unwrap().pipeline, PipelineState::Synthesizing);
    }
}
