//! Building voice prompts from reference audio.
//!
//! [`PromptPackager::make_prompt`] turns a waveform into a language-tagged
//! transcript; [`PromptPackager::make_npz_prompt`] goes further and writes a
//! self-contained [`VoicePromptArchive`] into the scratch directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::audio::{write_wav, RawAudio, Waveform};
use crate::error::VoiceError;
use crate::lang::Language;
use crate::model::{tokenize_audio, AudioCodec, ComputeDevice, PlacementGuard};
use crate::prompt::{sweep_stale_archives, VoicePromptArchive};
use crate::stt::Transcriber;
use crate::text::{TextCollater, TextTokenizer};

/// Where prompts are written and how long archives live.
#[derive(Debug, Clone)]
pub struct PackagerSettings {
    /// Working directory for the reference WAV and transcript.
    pub prompts_dir: PathBuf,
    /// Destination of generated archives; swept by TTL.
    pub scratch_dir: PathBuf,
    pub archive_ttl: Duration,
    /// Device the recognizer is placed on while transcribing.
    pub device: ComputeDevice,
}

/// Reject names that are empty or could escape their directory.
pub fn validate_prompt_name(name: &str) -> Result<&str, VoiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
    {
        return Err(VoiceError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

pub struct PromptPackager {
    transcriber: Transcriber,
    codec: Arc<dyn AudioCodec>,
    tokenizer: TextTokenizer,
    collater: TextCollater,
    settings: PackagerSettings,
}

impl PromptPackager {
    pub fn new(
        transcriber: Transcriber,
        codec: Arc<dyn AudioCodec>,
        tokenizer: TextTokenizer,
        collater: TextCollater,
        settings: PackagerSettings,
    ) -> Self {
        Self {
            transcriber,
            codec,
            tokenizer,
            collater,
            settings,
        }
    }

    pub fn codec(&self) -> &dyn AudioCodec {
        self.codec.as_ref()
    }

    pub fn tokenizer(&self) -> &TextTokenizer {
        &self.tokenizer
    }

    pub fn collater(&self) -> &TextCollater {
        &self.collater
    }

    pub fn settings(&self) -> &PackagerSettings {
        &self.settings
    }

    /// Delete stale archives from the scratch directory.
    pub fn sweep(&self) -> usize {
        sweep_stale_archives(&self.settings.scratch_dir, self.settings.archive_ttl)
    }

    /// Transcribe `waveform` and return the marker-wrapped transcript and
    /// its language.
    ///
    /// The waveform is peak-normalised if it exceeds unit range, written to
    /// `<prompts>/<name>.wav` and transcribed with the recognizer placed on
    /// the compute device.  The transcript goes to `<prompts>/<name>.txt`.
    /// Both files are removed afterwards unless `persist` is set.
    pub fn make_prompt(
        &self,
        name: &str,
        waveform: &Waveform,
        persist: bool,
    ) -> Result<(String, Language), VoiceError> {
        let name = validate_prompt_name(name)?;
        if waveform.is_empty() {
            return Err(VoiceError::NoAudio);
        }

        let mut audio = waveform.clone();
        if audio.peak_normalize() {
            log::debug!("prompt: {name}: peak-normalised");
        }

        std::fs::create_dir_all(&self.settings.prompts_dir)?;
        let wav_path = self.settings.prompts_dir.join(format!("{name}.wav"));
        let txt_path = self.settings.prompts_dir.join(format!("{name}.txt"));

        let result = self.transcribe_to_files(&audio, &wav_path, &txt_path);

        if !persist {
            for path in [&wav_path, &txt_path] {
                if let Err(e) = std::fs::remove_file(path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("prompt: failed to remove {}: {e}", path.display());
                    }
                }
            }
        }

        let (text, lang) = result?;
        log::info!("prompt: {name}: [{}] {text}", lang.code());
        Ok((text, lang))
    }

    fn transcribe_to_files(
        &self,
        audio: &Waveform,
        wav_path: &Path,
        txt_path: &Path,
    ) -> Result<(String, Language), VoiceError> {
        write_wav(wav_path, audio)?;

        let transcript = {
            let _active =
                PlacementGuard::acquire(self.transcriber.recognizer(), self.settings.device)?;
            self.transcriber.transcribe_file(wav_path)?
        };

        let lang = Language::from_code(&transcript.language)?;
        let text = lang.wrap(&transcript.text);
        std::fs::write(txt_path, &text)?;
        Ok((text, lang))
    }

    /// Build `<scratch>/<name>.npz` from the first non-empty audio source.
    ///
    /// Returns the status message shown in the UI and the archive path.
    pub fn make_npz_prompt(
        &self,
        name: &str,
        uploaded: Option<&RawAudio>,
        recorded: Option<&RawAudio>,
    ) -> Result<(String, PathBuf), VoiceError> {
        let removed = self.sweep();
        if removed > 0 {
            log::debug!("prompt: swept {removed} stale archive(s)");
        }

        let name = validate_prompt_name(name)?;
        let source = uploaded
            .filter(|a| !a.is_empty())
            .or(recorded.filter(|a| !a.is_empty()))
            .ok_or(VoiceError::NoAudio)?;

        let mut waveform = Waveform::from_raw(source);
        waveform.peak_normalize();

        let (text, lang) = self.make_prompt(name, &waveform, false)?;

        let frames = tokenize_audio(self.codec.as_ref(), &waveform)?;
        let audio_tokens = frames
            .into_iter()
            .next()
            .map(|f| f.codes)
            .ok_or(crate::model::ModelError::EmptyOutput)?;

        let tokens = self.tokenizer.tokenize(&text)?;
        let text_tokens = self.collater.collate_one(&tokens.ids).tokens;

        std::fs::create_dir_all(&self.settings.scratch_dir)?;
        let path = self.settings.scratch_dir.join(format!("{name}.npz"));
        VoicePromptArchive {
            audio_tokens,
            text_tokens,
            language: lang,
        }
        .save(&path)?;

        let message = format!("Detected language: {}\n Detected text {text}\n", lang.code());
        Ok((message, path))
    }
}
