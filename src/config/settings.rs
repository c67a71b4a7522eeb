//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` fills
//! the gaps with defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::model::{ComputeDevice, DecodingParams};

// ---------------------------------------------------------------------------
// ModelsConfig
// ---------------------------------------------------------------------------

/// Where the pretrained models live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Base URL of the codec / TTS sidecar.
    pub sidecar_url: String,
    /// HTTP timeout for a single sidecar call.  Inference on long text can
    /// take minutes on CPU.
    pub timeout_secs: u64,
    /// BPE vocabulary (`tokenizer.json` format).  `None` means
    /// `<models_dir>/bpe_69.json`.
    pub bpe_vocab: Option<PathBuf>,
    /// Phonemizer executable used before BPE encoding.
    pub espeak_command: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            sidecar_url: "http://127.0.0.1:8765".into(),
            timeout_secs: 300,
            bpe_vocab: None,
            espeak_command: "espeak-ng".into(),
        }
    }
}

impl ModelsConfig {
    pub fn bpe_vocab_path(&self, paths: &AppPaths) -> PathBuf {
        self.bpe_vocab
            .clone()
            .unwrap_or_else(|| paths.models_dir.join("bpe_69.json"))
    }
}

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper prompt transcriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Registry id of the GGML model (see `stt::WHISPER_MODELS`).
    pub model: String,
    pub beam_size: i32,
    /// CPU threads for Whisper.  `None` picks automatically.
    pub threads: Option<i32>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "whisper-medium".into(),
            beam_size: 5,
            threads: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthesisConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Top-k cut-off; negative leaves sampling unrestricted.
    pub top_k: i32,
    pub temperature: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let d = DecodingParams::default();
        Self {
            top_k: d.top_k,
            temperature: d.temperature,
        }
    }
}

impl SynthesisConfig {
    pub fn decoding(&self) -> DecodingParams {
        DecodingParams {
            top_k: self.top_k,
            temperature: self.temperature,
        }
    }
}

// ---------------------------------------------------------------------------
// PromptsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Working directory for reference WAV and transcript files.
    pub prompts_dir: PathBuf,
    /// Where generated `.npz` archives go.  `None` means the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Archives older than this are swept.
    pub archive_ttl_secs: u64,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            prompts_dir: PathBuf::from("prompts"),
            scratch_dir: None,
            archive_ttl_secs: 60,
        }
    }
}

impl PromptsConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn archive_ttl(&self) -> Duration {
        Duration::from_secs(self.archive_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

/// Compute device models are placed on while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub use_gpu: bool,
    pub gpu_index: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            use_gpu: false,
            gpu_index: 0,
        }
    }
}

impl DeviceConfig {
    pub fn device(&self) -> ComputeDevice {
        ComputeDevice::select(self.use_gpu, self.gpu_index)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Pre-filled text in the synthesis panels.
    pub default_text: String,
    /// Pre-filled archive name in the "Make prompt" panel.
    pub default_prompt_name: String,
    /// Play synthesized audio as soon as it is ready.
    pub autoplay: bool,
    /// Every synthesis is also saved here as `<timestamp>.wav`.
    pub outputs_dir: PathBuf,
    /// Microphone recordings stop growing past this length.
    pub max_record_secs: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_text: "Hello, it's nice to meet you.".into(),
            default_prompt_name: "prompt_1".into(),
            autoplay: true,
            outputs_dir: PathBuf::from("outputs"),
            max_record_secs: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use vallex_studio::config::AppConfig;
///
/// // Returns Default when the file is missing.
/// let mut config = AppConfig::load().unwrap();
/// config.device.use_gpu = true;
/// config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub stt: SttConfig,
    pub synthesis: SynthesisConfig,
    pub prompts: PromptsConfig,
    pub device: DeviceConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
