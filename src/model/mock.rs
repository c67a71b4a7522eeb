//! In-process stand-ins for the sidecar models, used by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use ndarray::Array2;

use super::{
    AcousticModel, AudioCodec, EncodedFrame, ModelError, Placeable, Placement, SynthesisRequest,
};
use crate::audio::Waveform;

pub const MOCK_QUANTIZERS: usize = 8;
pub const MOCK_HOP: usize = 320;
pub const MOCK_RATE: u32 = 24_000;

/// Codec that emits one `[8, len / 320]` chunk of code `7` and decodes each
/// code frame back to 320 samples of a low constant.
#[derive(Debug, Default)]
pub struct MockCodec;

impl MockCodec {
    pub fn new() -> Self {
        Self
    }
}

impl AudioCodec for MockCodec {
    fn sample_rate(&self) -> u32 {
        MOCK_RATE
    }

    fn encode(&self, waveform: &Waveform) -> Result<Vec<EncodedFrame>, ModelError> {
        let frames = (waveform.len() / MOCK_HOP).max(1);
        Ok(vec![EncodedFrame::new(Array2::from_elem(
            (MOCK_QUANTIZERS, frames),
            7,
        ))])
    }

    fn decode(&self, frames: &[EncodedFrame]) -> Result<Waveform, ModelError> {
        let n: usize = frames.iter().map(EncodedFrame::frames).sum();
        if n == 0 {
            return Err(ModelError::EmptyOutput);
        }
        Ok(Waveform::new(vec![0.05; n * MOCK_HOP], MOCK_RATE))
    }
}

/// Acoustic model that returns `frames` code frames per call, optionally
/// failing, and records placements and requests.
#[derive(Debug)]
pub struct MockAcousticModel {
    frames: usize,
    fail: AtomicBool,
    placements: Mutex<Vec<Placement>>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl MockAcousticModel {
    pub fn new(frames: usize) -> Self {
        Self {
            frames,
            fail: AtomicBool::new(false),
            placements: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let m = Self::new(1);
        m.fail.store(true, Ordering::SeqCst);
        m
    }

    pub fn placements(&self) -> Vec<Placement> {
        self.placements.lock().unwrap().clone()
    }

    pub fn last_placement(&self) -> Option<Placement> {
        self.placements.lock().unwrap().last().copied()
    }

    pub fn last_request(&self) -> Option<SynthesisRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Placeable for MockAcousticModel {
    fn place(&self, placement: Placement) -> Result<(), ModelError> {
        self.placements.lock().unwrap().push(placement);
        Ok(())
    }
}

impl AcousticModel for MockAcousticModel {
    fn inference(&self, request: &SynthesisRequest) -> Result<Array2<i64>, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ModelError::Request("mock inference failure".into()));
        }
        let q = request.audio_prompts.nrows().max(1);
        Ok(Array2::from_elem((q, self.frames), 3))
    }
}
