//! Voice prompts: packaging reference audio, the `.npz` archive format and
//! the scratch-directory sweep.

pub mod archive;
pub mod cleanup;
pub mod packager;

pub use archive::{ArchiveError, VoicePromptArchive};
pub use cleanup::sweep_stale_archives;
pub use packager::{validate_prompt_name, PackagerSettings, PromptPackager};
