//! Voice cloning studio around a VALL-E X style TTS model.
//!
//! Reference audio is transcribed with Whisper, tokenized with a neural
//! codec and packaged as a voice prompt; new text is then spoken in that
//! voice by the acoustic model.  The codec and acoustic model run in a
//! sidecar process reached over HTTP ([`model::remote`]); Whisper runs
//! in-process.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod lang;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod stt;
pub mod synthesis;
pub mod text;

#[cfg(test)]
mod test_support;

pub use error::VoiceError;
