//! Pretrained model interfaces: audio codec, acoustic (TTS) model and
//! device placement.
//!
//! Both models are reached through traits so the orchestration layer can be
//! tested with in-process mocks.  Production implementations live in
//! [`remote`] and talk to the model sidecar over HTTP.
//!
//! ```text
//!   Waveform ──encode──▶ [EncodedFrame] ─┐
//!                                        ▼
//!   text tokens ─────────────────▶ AcousticModel::inference ──▶ codes
//!                                                                 │
//!   Waveform (24 kHz) ◀──decode── [EncodedFrame] ◀────────────────┘
//! ```

pub mod acoustic;
pub mod codec;
pub mod error;
pub mod placement;
pub mod remote;

#[cfg(test)]
pub mod mock;

pub use acoustic::{AcousticModel, DecodingParams, SynthesisRequest};
pub use codec::{tokenize_audio, AudioCodec, EncodedFrame};
pub use error::ModelError;
pub use placement::{ComputeDevice, Placeable, Placement, PlacementGuard};
pub use remote::{Health, RemoteAcousticModel, RemoteCodec, SidecarClient, CODEC_SAMPLE_RATE};
