//! Text-to-speech acoustic model interface.
//!
//! The model continues an acoustic prompt: given the prompt's codec tokens,
//! the prompt text followed by the target text, and how many text tokens
//! belong to the prompt, it generates codec tokens for the target text in
//! the prompt speaker's voice.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{ModelError, Placeable};
use crate::lang::Language;

/// Sampling knobs for autoregressive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    /// Top-k cut-off; a negative value leaves sampling unrestricted.
    pub top_k: i32,
    pub temperature: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            top_k: -100,
            temperature: 1.0,
        }
    }
}

/// Everything one `inference` call consumes.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Collated `[batch, max_len]` text tokens (prompt text then target text).
    pub text_tokens: Array2<i64>,
    /// Valid length of each row of `text_tokens`.
    pub text_tokens_lens: Vec<usize>,
    /// `[quantizers, frames]` codec tokens of the acoustic prompt.
    pub audio_prompts: Array2<i64>,
    /// Number of text tokens that belong to the prompt.
    pub enroll_x_lens: Option<usize>,
    pub decoding: DecodingParams,
    pub prompt_language: Language,
    pub text_language: Language,
}

pub trait AcousticModel: Placeable {
    /// Generate `[quantizers, frames]` codec tokens for the target text.
    fn inference(&self, request: &SynthesisRequest) -> Result<Array2<i64>, ModelError>;
}

// Compile-time assertion: Box<dyn AcousticModel> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn AcousticModel>) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_decoding_is_unrestricted() {
        let d = DecodingParams::default();
        assert_eq!(d.top_k, -100);
        assert_eq!(d.temperature, 1.0);
    }
}
