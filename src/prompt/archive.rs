//! The `.npz` voice prompt archive.
//!
//! An archive holds everything needed to reuse a speaker without the
//! original recording:
//!
//! | Entry          | dtype | Shape                    |
//! |----------------|-------|--------------------------|
//! | `audio_tokens` | i64   | `[quantizers, frames]`   |
//! | `text_tokens`  | i64   | `[1, len]` (collated)    |
//! | `lang_code`    | i64   | scalar, 0 / 1 / 2        |
//!
//! The reader also accepts `audio_tokens` shaped `[1, frames, quantizers]`
//! and 1-D `text_tokens`, and int32 entries, so archives produced by other
//! tools load too.  There is no version field.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{arr0, Array2, ArrayD, Axis, Ix2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError, WriteNpzError};
use thiserror::Error;

use crate::lang::{LangError, Language};

const AUDIO_TOKENS: &str = "audio_tokens";
const TEXT_TOKENS: &str = "text_tokens";
const LANG_CODE: &str = "lang_code";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write archive: {0}")]
    Write(#[from] WriteNpzError),

    #[error("failed to read archive: {0}")]
    Read(#[from] ReadNpzError),

    #[error("archive has no {0:?} entry")]
    Missing(&'static str),

    #[error("archive entry {name:?} has unsupported shape {shape:?}")]
    Shape { name: &'static str, shape: Vec<usize> },

    #[error(transparent)]
    Lang(#[from] LangError),
}

/// Decoded contents of a voice prompt archive.
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePromptArchive {
    /// `[quantizers, frames]`.
    pub audio_tokens: Array2<i64>,
    /// `[1, len]`.
    pub text_tokens: Array2<i64>,
    pub language: Language,
}

impl VoicePromptArchive {
    /// Number of prompt text tokens.
    pub fn text_len(&self) -> usize {
        self.text_tokens.ncols()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        let file = File::create(path.as_ref())?;
        let mut npz = NpzWriter::new(file);
        npz.add_array(AUDIO_TOKENS, &self.audio_tokens)?;
        npz.add_array(TEXT_TOKENS, &self.text_tokens)?;
        npz.add_array(LANG_CODE, &arr0(self.language.numeric()))?;
        npz.finish()?;
        log::debug!(
            "prompt: wrote {} ({}x{} audio, {} text)",
            path.as_ref().display(),
            self.audio_tokens.nrows(),
            self.audio_tokens.ncols(),
            self.text_len()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let file = File::open(path.as_ref())?;
        let mut npz = NpzReader::new(file)?;

        let audio = read_entry(&mut npz, AUDIO_TOKENS)?;
        let text = read_entry(&mut npz, TEXT_TOKENS)?;
        let lang = read_entry(&mut npz, LANG_CODE)?;

        let audio_tokens = audio_grid(audio)?;
        let text_tokens = text_row(text)?;
        let code = match lang.len() {
            1 => lang.iter().copied().next().unwrap_or_default(),
            _ => {
                return Err(ArchiveError::Shape {
                    name: LANG_CODE,
                    shape: lang.shape().to_vec(),
                })
            }
        };
        let language = Language::from_numeric(code)?;

        Ok(Self {
            audio_tokens,
            text_tokens,
            language,
        })
    }
}

/// Read `name` (or `name.npy`) as i64, widening int32 entries.
fn read_entry<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    name: &'static str,
) -> Result<ArrayD<i64>, ArchiveError> {
    let with_ext = format!("{name}.npy");
    let stored = npz
        .names()?
        .into_iter()
        .find(|n| n == name || *n == with_ext)
        .ok_or(ArchiveError::Missing(name))?;

    match npz.by_name::<ndarray::OwnedRepr<i64>, ndarray::IxDyn>(&stored) {
        Ok(a) => Ok(a),
        Err(ReadNpzError::Npy(_)) => {
            let narrow: ArrayD<i32> = npz.by_name(&stored)?;
            Ok(narrow.mapv(i64::from))
        }
        Err(e) => Err(e.into()),
    }
}

fn audio_grid(a: ArrayD<i64>) -> Result<Array2<i64>, ArchiveError> {
    let shape = a.shape().to_vec();
    let bad = || ArchiveError::Shape {
        name: AUDIO_TOKENS,
        shape: shape.clone(),
    };
    match shape.len() {
        2 => a.into_dimensionality::<Ix2>().map_err(|_| bad()),
        // [1, frames, quantizers] → [quantizers, frames]
        3 if shape[0] == 1 => {
            let grid = a
                .index_axis_move(Axis(0), 0)
                .into_dimensionality::<Ix2>()
                .map_err(|_| bad())?;
            Ok(grid.reversed_axes().as_standard_layout().into_owned())
        }
        _ => Err(bad()),
    }
}

fn text_row(a: ArrayD<i64>) -> Result<Array2<i64>, ArchiveError> {
    let shape = a.shape().to_vec();
    let bad = || ArchiveError::Shape {
        name: TEXT_TOKENS,
        shape: shape.clone(),
    };
    match shape.len() {
        1 => a
            .insert_axis(Axis(0))
            .into_dimensionality::<Ix2>()
            .map_err(|_| bad()),
        2 if shape[0] == 1 => a.into_dimensionality::<Ix2>().map_err(|_| bad()),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array3};
    use tempfile::tempdir;

    fn sample() -> VoicePromptArchive {
        VoicePromptArchive {
            audio_tokens: array![[1_i64, 2, 3], [4, 5, 6]],
            text_tokens: array![[10_i64, 11, 12, 13]],
            language: Language::Ja,
        }
    }

    #[test]
    fn save_then_load_preserves_arrays_and_language() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speaker.npz");
        let archive = sample();
        archive.save(&path).unwrap();

        let loaded = VoicePromptArchive::load(&path).unwrap();
        assert_eq!(loaded, archive);
        assert_eq!(loaded.text_len(), 4);
        assert_eq!(loaded.text_tokens, array![[10_i64, 11, 12, 13]]);
    }

    #[test]
    fn unknown_lang_code_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array(AUDIO_TOKENS, &array![[1_i64]]).unwrap();
        npz.add_array(TEXT_TOKENS, &array![[1_i64]]).unwrap();
        npz.add_array(LANG_CODE, &arr0(7_i64)).unwrap();
        npz.finish().unwrap();

        assert!(matches!(
            VoicePromptArchive::load(&path),
            Err(ArchiveError::Lang(LangError::UnknownNumeric(7)))
        ));
    }

    #[test]
    fn missing_entry_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array(AUDIO_TOKENS, &array![[1_i64]]).unwrap();
        npz.finish().unwrap();

        assert!(matches!(
            VoicePromptArchive::load(&path),
            Err(ArchiveError::Missing(TEXT_TOKENS))
        ));
    }

    #[test]
    fn batch_first_audio_tokens_are_transposed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.npz");
        // [1, frames=3, quantizers=2]
        let audio = Array3::from_shape_vec((1, 3, 2), vec![1_i64, 4, 2, 5, 3, 6]).unwrap();
        let text: Array1<i64> = array![7, 8];
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array(AUDIO_TOKENS, &audio).unwrap();
        npz.add_array(TEXT_TOKENS, &text).unwrap();
        npz.add_array(LANG_CODE, &arr0(0_i64)).unwrap();
        npz.finish().unwrap();

        let loaded = VoicePromptArchive::load(&path).unwrap();
        assert_eq!(loaded.audio_tokens, array![[1_i64, 2, 3], [4, 5, 6]]);
        assert_eq!(loaded.text_tokens, array![[7_i64, 8]]);
        assert_eq!(loaded.language, Language::Zh);
    }

    #[test]
    fn int32_entries_are_widened() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("i32.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array(AUDIO_TOKENS, &array![[1_i32, 2]]).unwrap();
        npz.add_array(TEXT_TOKENS, &array![[3_i32]]).unwrap();
        npz.add_array(LANG_CODE, &arr0(2_i32)).unwrap();
        npz.finish().unwrap();

        let loaded = VoicePromptArchive::load(&path).unwrap();
        assert_eq!(loaded.audio_tokens, array![[1_i64, 2]]);
        assert_eq!(loaded.language, Language::En);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            VoicePromptArchive::load("/nonexistent/x.npz"),
            Err(ArchiveError::Io(_))
        ));
    }
}
