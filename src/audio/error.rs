use thiserror::Error;

/// Errors from WAV I/O and sample-rate conversion.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("WAV I/O failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("WAV file has no channels")]
    NoChannels,

    #[error("resampling {from} Hz → {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
}
