//! Whisper model registry and on-disk path resolution.
//!
//! Prompt transcription needs language identification across Chinese,
//! Japanese and English, so only the multilingual GGML checkpoints are
//! listed.  English-only (`.en`) variants cannot detect language.

use std::path::PathBuf;

use crate::config::AppPaths;

/// Approximate capacity tier of a Whisper GGML model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSize {
    Small,
    Medium,
    Large,
}

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// Identifier used in `SttConfig::model` (e.g. `"whisper-medium"`).
    pub id: &'static str,
    pub display_name: &'static str,
    pub size: ModelSize,
    /// File name under the models directory.
    pub file_name: &'static str,
    pub file_size_mb: u64,
    pub ram_required_mb: u64,
    pub source_url: &'static str,
}

/// Multilingual whisper.cpp checkpoints.
pub const WHISPER_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-small",
        display_name: "Whisper Small (Multilingual)",
        size: ModelSize::Small,
        file_name: "ggml-small.bin",
        file_size_mb: 466,
        ram_required_mb: 1_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        id: "whisper-medium",
        display_name: "Whisper Medium (Multilingual) [Recommended]",
        size: ModelSize::Medium,
        file_name: "ggml-medium.bin",
        file_size_mb: 1_500,
        ram_required_mb: 3_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        id: "whisper-large-v3",
        display_name: "Whisper Large-v3 (Multilingual)",
        size: ModelSize::Large,
        file_name: "ggml-large-v3.bin",
        file_size_mb: 3_100,
        ram_required_mb: 6_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
];

/// Find a [`ModelInfo`] by its `id`.
pub fn find_model_by_id(id: &str) -> Option<&'static ModelInfo> {
    WHISPER_MODELS.iter().find(|m| m.id == id)
}

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves model file locations under the models directory.
///
/// ```rust,no_run
/// use vallex_studio::config::AppPaths;
/// use vallex_studio::stt::{ModelPaths, WHISPER_MODELS};
///
/// let paths = ModelPaths::from_app_paths(&AppPaths::new());
/// let available: Vec<_> = WHISPER_MODELS.iter()
///     .filter(|m| paths.is_available(m))
///     .collect();
/// ```
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }

    pub fn is_available(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    /// Registry entries whose file is present on disk.
    pub fn list_local_models(&self) -> Vec<&'static ModelInfo> {
        WHISPER_MODELS
            .iter()
            .filter(|m| self.is_available(m))
            .collect()
    }

    /// Message explaining how to obtain `model` when its file is missing.
    /// Mentions any other registry models already on disk.
    pub fn missing_model_hint(&self, model: &ModelInfo) -> String {
        let mut hint = format!(
            "{} not found at {}. Download {} ({} MB, needs about {} MB RAM) from {}",
            model.display_name,
            self.model_path(model).display(),
            model.file_name,
            model.file_size_mb,
            model.ram_required_mb,
            model.source_url,
        );
        let local: Vec<_> = self.list_local_models().iter().map(|m| m.id).collect();
        if !local.is_empty() {
            hint.push_str(&format!(", or set stt.model to one of: {}", local.join(", ")));
        }
        hint
    }
}
