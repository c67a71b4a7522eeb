use thiserror::Error;

use crate::audio::AudioError;
use crate::lang::LangError;
use crate::model::ModelError;
use crate::prompt::ArchiveError;
use crate::stt::SttError;
use crate::text::TokenizerError;

/// Everything that can fail while packaging a prompt or synthesizing speech.
///
/// This is what the pipeline shows in the message area; the app keeps
/// running after any of these.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("invalid prompt name {0:?}: must be non-empty with no path separators or '..'")]
    InvalidName(String),

    #[error("no reference audio: upload a WAV file or record one")]
    NoAudio,

    #[error(transparent)]
    Lang(#[from] LangError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("speech recognition failed: {0}")]
    Stt(#[from] SttError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("voice prompt archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
