//! Per-language grapheme-to-phoneme conversion.
//!
//! The BPE vocabulary covers IPA phonemes, not raw graphemes, so every marked
//! span is phonemized with its own language's rules before encoding.  Text
//! outside any marker pair is passed through unchanged.

use std::process::Command;

use crate::lang::Language;

use super::TokenizerError;

/// Converts text in a known language to an IPA phoneme string.
pub trait Phonemizer: Send + Sync {
    fn phonemize(&self, text: &str, language: Language) -> Result<String, TokenizerError>;

    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// EspeakPhonemizer
// ---------------------------------------------------------------------------

/// [`Phonemizer`] backed by the `espeak-ng` command.
///
/// Requires espeak-ng with the Mandarin and Japanese voices installed:
/// - Linux: `apt-get install espeak-ng`
/// - macOS: `brew install espeak-ng`
pub struct EspeakPhonemizer {
    command: String,
}

impl EspeakPhonemizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// espeak-ng voice used for `language`.
    pub fn voice(language: Language) -> &'static str {
        match language {
            Language::Zh => "cmn",
            Language::Ja => "ja",
            Language::En => "en-us",
        }
    }

    /// Run `espeak-ng --version` to fail early when the binary is missing.
    pub fn check_available(&self) -> Result<String, TokenizerError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .map_err(|e| {
                TokenizerError::Phonemize(format!("failed to run {}: {e}", self.command))
            })?;
        if !output.status.success() {
            return Err(TokenizerError::Phonemize(format!(
                "{} --version exited with {}",
                self.command, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for EspeakPhonemizer {
    fn default() -> Self {
        Self::new("espeak-ng")
    }
}

impl Phonemizer for EspeakPhonemizer {
    fn phonemize(&self, text: &str, language: Language) -> Result<String, TokenizerError> {
        let output = Command::new(&self.command)
            .args(["--ipa", "-q", "-v", Self::voice(language)])
            .arg(text)
            .output()
            .map_err(|e| {
                TokenizerError::Phonemize(format!("failed to run {}: {e}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TokenizerError::Phonemize(format!(
                "{} ({}) failed: {}",
                self.command,
                Self::voice(language),
                stderr.trim()
            )));
        }

        // espeak-ng prints one line per clause.
        let phonemes = String::from_utf8_lossy(&output.stdout);
        Ok(phonemes.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn name(&self) -> &'static str {
        "espeak-ng"
    }
}

/// Prefixes every span with its ISO code, for tests.
#[cfg(test)]
pub struct CodePrefixPhonemizer;

#[cfg(test)]
impl Phonemizer for CodePrefixPhonemizer {
    fn phonemize(&self, text: &str, language: Language) -> Result<String, TokenizerError> {
        Ok(format!("{}:{text}", language.code()))
    }

    fn name(&self) -> &'static str {
        "code-prefix"
    }
}
