//! Sample-rate conversion.
//!
//! Whisper wants 16 kHz, the codec wants its own rate (24 kHz for Encodec)
//! and the output device wants whatever it reports.  [`resample`] converts a
//! whole mono buffer in one shot with `rubato`'s windowed-sinc resampler
//! (`SincFixedIn` + `BlackmanHarris2`).
//!
//! The output length is `round(samples.len() * to / from)`; the resampler's
//! group delay is trimmed from the front and the tail is flushed, so the
//! output stays time-aligned with the input.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::AudioError;

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample mono `samples` from `from` Hz to `to` Hz.
///
/// Equal rates and empty input are returned unchanged.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    if from == 0 {
        return Err(AudioError::InvalidSampleRate(from));
    }
    if to == 0 {
        return Err(AudioError::InvalidSampleRate(to));
    }
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let err = |e: &dyn std::fmt::Display| AudioError::Resample {
        from,
        to,
        reason: e.to_string(),
    };

    let ratio = to as f64 / from as f64;
    let expected = (samples.len() as f64 * ratio).round() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_params(), samples.len(), 1)
        .map_err(|e| err(&e))?;
    let delay = resampler.output_delay();

    let mut out = resampler
        .process(&[samples], None)
        .map_err(|e| err(&e))?
        .swap_remove(0);

    // Flush the filter until the delayed tail has come out.
    while out.len() < expected + delay {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| err(&e))?
            .swap_remove(0);
        if tail.is_empty() {
            break;
        }
        out.extend(tail);
    }

    let mut out: Vec<f32> = out.into_iter().skip(delay).take(expected).collect();
    out.resize(expected, 0.0);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        let out = resample(&input, 16_000, 16_000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn empty_input() {
        assert!(resample(&[], 48_000, 16_000).unwrap().is_empty());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            resample(&[0.0; 4], 0, 16_000),
            Err(AudioError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn downsample_output_length() {
        let input = vec![0.0_f32; 4_800];
        let out = resample(&input, 48_000, 16_000).unwrap();
        assert_eq!(out.len(), 1_600);
    }

    #[test]
    fn upsample_output_length() {
        // 1 s @ 16 kHz → 1 s @ 24 kHz (Encodec rate)
        let input = vec![0.0_f32; 16_000];
        let out = resample(&input, 16_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
    }

    #[test]
    fn constant_signal_keeps_amplitude_away_from_edges() {
        let input = vec![0.5_f32; 4_800];
        let out = resample(&input, 48_000, 16_000).unwrap();
        for &s in &out[400..1_200] {
            assert!((s - 0.5).abs() < 1e-2, "amplitude drift: {s}");
        }
    }
}
