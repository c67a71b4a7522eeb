//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::audio::Waveform;
use crate::model::mock::{MockAcousticModel, MockCodec};
use crate::model::ComputeDevice;
use crate::prompt::{PackagerSettings, PromptPackager};
use crate::stt::{MockRecognizer, Transcriber};
use crate::synthesis::Synthesizer;
use crate::text::{CharEncoder, CodePrefixPhonemizer, TextCollater, TextTokenizer};

/// A 220 Hz sine at half amplitude.
pub fn tone(secs: f32, sample_rate: u32) -> Waveform {
    let n = (secs * sample_rate as f32) as usize;
    let samples = (0..n)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sample_rate as f32).sin())
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Packager over mock models, writing under a fresh temp dir.
pub fn packager_with(
    recognizer: MockRecognizer,
) -> (TempDir, PromptPackager, Arc<MockRecognizer>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let recognizer = Arc::new(recognizer);
    let settings = PackagerSettings {
        prompts_dir: dir.path().join("prompts"),
        scratch_dir: dir.path().join("scratch"),
        archive_ttl: Duration::from_secs(60),
        device: ComputeDevice::Cpu,
    };
    let packager = PromptPackager::new(
        Transcriber::new(recognizer.clone()),
        Arc::new(MockCodec::new()),
        TextTokenizer::new(Arc::new(CharEncoder), Arc::new(CodePrefixPhonemizer)),
        TextCollater::default(),
        settings,
    );
    (dir, packager, recognizer)
}

/// Synthesizer over mock models.  The acoustic model emits 50 code frames.
pub fn synthesizer_with(
    recognizer: MockRecognizer,
    model: MockAcousticModel,
) -> (TempDir, Synthesizer, Arc<MockAcousticModel>) {
    let (dir, packager, _) = packager_with(recognizer);
    let model = Arc::new(model);
    let synth = Synthesizer::new(
        Arc::new(packager),
        model.clone(),
        Default::default(),
        ComputeDevice::Cpu,
    );
    (dir, synth, model)
}
