//! Neural audio codec interface.
//!
//! An [`AudioCodec`] turns a mono waveform into one or more
//! [`EncodedFrame`]s, each a `[quantizers, frames]` grid of discrete codes,
//! and turns grids back into audio at its native rate (24 kHz for Encodec).

use ndarray::Array2;

use super::ModelError;
use crate::audio::{resample, Waveform};

/// One codec chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    /// `[quantizers, frames]` code indices.
    pub codes: Array2<i64>,
    /// Per-chunk normalisation scale, when the codec uses one.
    pub scale: Option<f32>,
}

impl EncodedFrame {
    pub fn new(codes: Array2<i64>) -> Self {
        Self { codes, scale: None }
    }

    pub fn quantizers(&self) -> usize {
        self.codes.nrows()
    }

    pub fn frames(&self) -> usize {
        self.codes.ncols()
    }
}

pub trait AudioCodec: Send + Sync {
    /// Native sample rate of both [`encode`](Self::encode) input and
    /// [`decode`](Self::decode) output.
    fn sample_rate(&self) -> u32;

    /// Encode a mono waveform already at [`sample_rate`](Self::sample_rate).
    fn encode(&self, waveform: &Waveform) -> Result<Vec<EncodedFrame>, ModelError>;

    fn decode(&self, frames: &[EncodedFrame]) -> Result<Waveform, ModelError>;
}

/// Resample `waveform` to the codec rate if needed, then encode it.
pub fn tokenize_audio(
    codec: &dyn AudioCodec,
    waveform: &Waveform,
) -> Result<Vec<EncodedFrame>, ModelError> {
    let rate = codec.sample_rate();
    let frames = if waveform.sample_rate == rate {
        codec.encode(waveform)?
    } else {
        let samples = resample(&waveform.samples, waveform.sample_rate, rate)?;
        codec.encode(&Waveform::new(samples, rate))?
    };
    if frames.is_empty() {
        return Err(ModelError::EmptyOutput);
    }
    log::debug!(
        "codec: {} chunk(s), first {}x{}",
        frames.len(),
        frames[0].quantizers(),
        frames[0].frames()
    );
    Ok(frames)
}

/// Build a grid from row vectors, rejecting ragged input.
pub fn grid_from_rows(rows: Vec<Vec<i64>>) -> Result<Array2<i64>, ModelError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(ModelError::Shape(format!(
            "row {i} has {} columns, expected {n_cols}",
            row.len()
        )));
    }
    let flat: Vec<i64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| ModelError::Shape(e.to_string()))
}

/// Row-major nested vectors, the JSON shape of a grid.
pub fn grid_to_rows(grid: &Array2<i64>) -> Vec<Vec<i64>> {
    grid.outer_iter().map(|row| row.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::MockCodec;
    use ndarray::array;

    #[test]
    fn grid_rows_round_trip() {
        let g = array![[1_i64, 2, 3], [4, 5, 6]];
        assert_eq!(grid_from_rows(grid_to_rows(&g)).unwrap(), g);
    }

    #[test]
    fn ragged_rows_are_a_shape_error() {
        let err = grid_from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, ModelError::Shape(_)));
    }

    #[test]
    fn empty_rows_make_empty_grid() {
        let g = grid_from_rows(Vec::new()).unwrap();
        assert_eq!(g.dim(), (0, 0));
    }

    #[test]
    fn tokenize_audio_resamples_to_codec_rate() {
        let codec = MockCodec::new();
        // 0.5 s at 16 kHz becomes 12 000 samples at 24 kHz → 37 code frames
        // at the mock's 320-sample hop.
        let frames = tokenize_audio(&codec, &Waveform::new(vec![0.1; 8_000], 16_000)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].quantizers(), 8);
        assert_eq!(frames[0].frames(), 12_000 / 320);
    }
}
