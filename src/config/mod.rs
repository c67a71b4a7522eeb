//! Configuration for VALL-E X Studio.
//!
//! Provides `AppConfig` (top-level settings) with one section per subsystem,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, DeviceConfig, ModelsConfig, PromptsConfig, SttConfig, SynthesisConfig, UiConfig,
};
