//! Speech synthesis from a reference recording or a saved voice prompt.
//!
//! Both entry points build the same [`SynthesisRequest`]: prompt text tokens
//! followed by target text tokens, the prompt's codec tokens, and the number
//! of text tokens belonging to the prompt (`enroll_x_lens`).  They differ
//! only in where the prompt comes from.
//!
//! The acoustic model is held on the compute device by a [`PlacementGuard`]
//! for the rest of the call once the prompt is ready, so it is offloaded
//! again however the call ends.

use std::path::Path;
use std::sync::Arc;

use ndarray::{concatenate, Axis};

use crate::audio::{RawAudio, Waveform};
use crate::error::VoiceError;
use crate::lang::{Accent, LanguageChoice};
use crate::model::{
    tokenize_audio, AcousticModel, ComputeDevice, DecodingParams, EncodedFrame, ModelError,
    PlacementGuard, SynthesisRequest,
};
use crate::prompt::{PromptPackager, VoicePromptArchive};

/// A finished synthesis.
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Human-readable summary for the message area.
    pub message: String,
    /// Generated speech at the codec rate (24 kHz).
    pub waveform: Waveform,
}

pub struct Synthesizer {
    packager: Arc<PromptPackager>,
    model: Arc<dyn AcousticModel>,
    decoding: DecodingParams,
    device: ComputeDevice,
}

impl Synthesizer {
    pub fn new(
        packager: Arc<PromptPackager>,
        model: Arc<dyn AcousticModel>,
        decoding: DecodingParams,
        device: ComputeDevice,
    ) -> Self {
        Self {
            packager,
            model,
            decoding,
            device,
        }
    }

    pub fn packager(&self) -> &PromptPackager {
        &self.packager
    }

    /// Clone the voice in `prompt_audio` and speak `text` with it.
    pub fn infer_from_audio(
        &self,
        text: &str,
        choice: LanguageChoice,
        accent: Accent,
        prompt_audio: &RawAudio,
    ) -> Result<Synthesis, VoiceError> {
        if prompt_audio.is_empty() {
            return Err(VoiceError::NoAudio);
        }
        let mut waveform = Waveform::from_raw(prompt_audio);
        waveform.peak_normalize();

        let name = uuid::Uuid::new_v4().simple().to_string();
        let (prompt_text, prompt_lang) = self.packager.make_prompt(&name, &waveform, false)?;
        let target_text = choice.wrap(text);

        let _active = PlacementGuard::acquire(self.model.as_ref(), self.device)?;

        let audio_prompts = tokenize_audio(self.packager.codec(), &waveform)?
            .into_iter()
            .next()
            .map(|f| f.codes)
            .ok_or(ModelError::EmptyOutput)?;

        let tokenizer = self.packager.tokenizer();
        let collater = self.packager.collater();
        log::info!("synthesis: {target_text}");

        let full = tokenizer.tokenize(format!("{prompt_text}{target_text}").trim())?;
        let batch = collater.collate_one(&full.ids);
        let enroll = collater
            .collate_one(&tokenizer.tokenize(prompt_text.trim())?.ids)
            .first_len();

        let text_language = accent.apply(choice.resolve(&target_text, prompt_lang));
        let waveform = self.generate(SynthesisRequest {
            text_tokens: batch.tokens,
            text_tokens_lens: batch.lens,
            audio_prompts,
            enroll_x_lens: Some(enroll),
            decoding: self.decoding,
            prompt_language: prompt_lang,
            text_language,
        })?;

        Ok(Synthesis {
            message: format!("text prompt: {prompt_text}\nsynthesized text: {target_text}"),
            waveform,
        })
    }

    /// Speak `text` with the voice stored in the archive at `archive_path`.
    pub fn infer_from_prompt(
        &self,
        text: &str,
        choice: LanguageChoice,
        accent: Accent,
        archive_path: &Path,
    ) -> Result<Synthesis, VoiceError> {
        // Load before sweeping so the archive being used cannot be removed.
        let archive = VoicePromptArchive::load(archive_path)?;

        let _active = PlacementGuard::acquire(self.model.as_ref(), self.device)?;
        self.packager.sweep();

        let target_text = choice.wrap(text);
        log::info!("synthesis: {target_text}");

        let enroll = archive.text_len();
        let target = self
            .packager
            .tokenizer()
            .tokenize(format!("_{target_text}").trim())?;
        let target = self.packager.collater().collate_one(&target.ids);

        let text_tokens = concatenate(
            Axis(1),
            &[archive.text_tokens.view(), target.tokens.view()],
        )
        .map_err(|e| ModelError::Shape(e.to_string()))?;
        let text_tokens_lens = target.lens.iter().map(|l| l + enroll).collect();

        let text_language = accent.apply(choice.resolve(&target_text, archive.language));
        let waveform = self.generate(SynthesisRequest {
            text_tokens,
            text_tokens_lens,
            audio_prompts: archive.audio_tokens,
            enroll_x_lens: Some(enroll),
            decoding: self.decoding,
            prompt_language: archive.language,
            text_language,
        })?;

        Ok(Synthesis {
            message: format!("synthesized text: {target_text}"),
            waveform,
        })
    }

    fn generate(&self, request: SynthesisRequest) -> Result<Waveform, VoiceError> {
        log::debug!(
            "synthesis: {} text tokens (enroll {:?}), prompt {}x{}, {} → {}",
            request.text_tokens.ncols(),
            request.enroll_x_lens,
            request.audio_prompts.nrows(),
            request.audio_prompts.ncols(),
            request.prompt_language,
            request.text_language,
        );
        let codes = self.model.inference(&request)?;
        let waveform = self.packager.codec().decode(&[EncodedFrame::new(codes)])?;
        if waveform.is_empty() {
            return Err(ModelError::EmptyOutput.into());
        }
        Ok(waveform)
    }
}
