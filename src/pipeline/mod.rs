//! Pipeline orchestrator and the state the UI renders.
//!
//! # Architecture
//!
//! ```text
//! egui panels ── PipelineCommand (mpsc) ──▶ PipelineOrchestrator::run()  ← tokio task
//!                                                 │
//!                                                 ├─ MakePrompt      → Packaging
//!                                                 │     spawn_blocking(PromptPackager::make_npz_prompt)
//!                                                 │
//!                                                 └─ InferFrom{Audio,Prompt} → Synthesizing
//!                                                       spawn_blocking(Synthesizer::infer_*)
//!                                                       save <outputs>/<timestamp>.wav
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by egui update() each frame
//! ```
//!
//! Commands run strictly one after another: the models are placed on the
//! compute device for one request at a time.

pub mod runner;
pub mod state;

pub use runner::{PipelineCommand, PipelineError, PipelineOrchestrator, PromptSource};
pub use state::{new_shared_state, AppState, PipelineState, SharedState};
