//! Marker-aware text tokenization.
//!
//! Input text may carry language markers (`[ZH]…[ZH]`, `[EN]…[EN]`).  The
//! tokenizer strips them, phonemizes each marked span with that language's
//! rules, normalises whitespace runs to `_` (the word separator in the TTS
//! vocabulary), encodes the result with the BPE vocabulary and tags every
//! resulting id with its span's language.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokenizers::Tokenizer;

use crate::lang::{split_marked, Language};

use super::Phonemizer;

#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("failed to load BPE vocabulary {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("failed to encode text: {0}")]
    Encode(String),

    #[error("phonemizer failed: {0}")]
    Phonemize(String),

    #[error("text is empty after removing language markers")]
    EmptyText,
}

/// Turns a marker-free string into vocabulary ids.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<i64>, TokenizerError>;
}

// ---------------------------------------------------------------------------
// BpeEncoder
// ---------------------------------------------------------------------------

/// [`TextEncoder`] backed by a HuggingFace `tokenizer.json` vocabulary.
pub struct BpeEncoder {
    inner: Tokenizer,
}

impl BpeEncoder {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenizerError> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path).map_err(|e| TokenizerError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        log::info!(
            "text: loaded BPE vocabulary {} ({} entries)",
            path.display(),
            inner.get_vocab_size(true)
        );
        Ok(Self { inner })
    }
}

impl TextEncoder for BpeEncoder {
    fn encode(&self, text: &str) -> Result<Vec<i64>, TokenizerError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenizerError::Encode(e.to_string()))?;
        Ok(encoding.get_ids().iter().map(|&id| id as i64).collect())
    }
}

// ---------------------------------------------------------------------------
// TextTokenizer
// ---------------------------------------------------------------------------

/// Token ids plus the language each id came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    pub ids: Vec<i64>,
    /// Same length as `ids`; `None` for text outside any marker pair.
    pub langs: Vec<Option<Language>>,
}

impl TokenizedText {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Replace every run of whitespace with a single `_`.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[derive(Clone)]
pub struct TextTokenizer {
    encoder: Arc<dyn TextEncoder>,
    phonemizer: Arc<dyn Phonemizer>,
}

impl TextTokenizer {
    pub fn new(encoder: Arc<dyn TextEncoder>, phonemizer: Arc<dyn Phonemizer>) -> Self {
        Self {
            encoder,
            phonemizer,
        }
    }

    /// Load the BPE vocabulary at `path`.
    pub fn from_file(
        path: impl AsRef<Path>,
        phonemizer: Arc<dyn Phonemizer>,
    ) -> Result<Self, TokenizerError> {
        Ok(Self::new(Arc::new(BpeEncoder::from_file(path)?), phonemizer))
    }

    pub fn tokenize(&self, text: &str) -> Result<TokenizedText, TokenizerError> {
        let mut ids = Vec::new();
        let mut langs = Vec::new();

        for span in split_marked(text.trim()) {
            let spoken = match span.language {
                Some(lang) => self.phonemizer.phonemize(span.text, lang)?,
                None => span.text.to_string(),
            };
            let normalized = normalize_whitespace(&spoken);
            let span_ids = self.encoder.encode(&normalized)?;
            langs.extend(std::iter::repeat(span.language).take(span_ids.len()));
            ids.extend(span_ids);
        }

        if ids.is_empty() {
            return Err(TokenizerError::EmptyText);
        }
        Ok(TokenizedText { ids, langs })
    }
}

/// One id per `char`, for tests.
#[cfg(test)]
pub struct CharEncoder;

#[cfg(test)]
impl TextEncoder for CharEncoder {
    fn encode(&self, text: &str) -> Result<Vec<i64>, TokenizerError> {
        Ok(text.chars().map(|c| c as i64).collect())
    }
}
