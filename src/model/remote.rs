//! HTTP client for the model sidecar.
//!
//! The codec and the acoustic model run in a separate process that owns the
//! pretrained weights.  It speaks a small JSON protocol:
//!
//! | Method | Path                 | Body → Response                                   |
//! |--------|----------------------|---------------------------------------------------|
//! | GET    | `/v1/health`         | → `{ready, missing_keys}`                          |
//! | POST   | `/v1/codec/encode`   | `{sample_rate, samples}` → `{frames}`              |
//! | POST   | `/v1/codec/decode`   | `{frames}` → `{sample_rate, samples}`              |
//! | POST   | `/v1/tts/inference`  | request fields → `{codes}`                         |
//! | POST   | `/v1/tts/placement`  | `{device}` → empty                                 |
//!
//! Calls are blocking; they run on tokio's blocking pool via the pipeline.
//! The only timeout is the HTTP client's, taken from [`ModelsConfig`].

use std::sync::Arc;
use std::time::Duration;

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::codec::{grid_from_rows, grid_to_rows};
use super::{
    AcousticModel, AudioCodec, ComputeDevice, EncodedFrame, ModelError, Placeable, Placement,
    SynthesisRequest,
};
use crate::audio::Waveform;
use crate::config::ModelsConfig;

/// Encodec's native sample rate.
pub const CODEC_SAMPLE_RATE: u32 = 24_000;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub ready: bool,
    #[serde(default)]
    pub missing_keys: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    codes: Vec<Vec<i64>>,
    scale: Option<f32>,
}

#[derive(Debug, Serialize)]
struct EncodeBody<'a> {
    sample_rate: u32,
    samples: &'a [f32],
}

#[derive(Debug, Deserialize)]
struct EncodeReply {
    frames: Vec<WireFrame>,
}

#[derive(Debug, Serialize)]
struct DecodeBody {
    frames: Vec<WireFrame>,
}

#[derive(Debug, Deserialize)]
struct DecodeReply {
    sample_rate: u32,
    samples: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct InferenceBody {
    text_tokens: Vec<Vec<i64>>,
    text_tokens_lens: Vec<usize>,
    audio_prompts: Vec<Vec<i64>>,
    enroll_x_lens: Option<usize>,
    top_k: i32,
    temperature: f32,
    prompt_language: &'static str,
    text_language: &'static str,
}

#[derive(Debug, Deserialize)]
struct InferenceReply {
    codes: Vec<Vec<i64>>,
}

#[derive(Debug, Serialize)]
struct PlacementBody {
    device: String,
}

impl From<&EncodedFrame> for WireFrame {
    fn from(f: &EncodedFrame) -> Self {
        Self {
            codes: grid_to_rows(&f.codes),
            scale: f.scale,
        }
    }
}

impl TryFrom<WireFrame> for EncodedFrame {
    type Error = ModelError;

    fn try_from(w: WireFrame) -> Result<Self, ModelError> {
        Ok(Self {
            codes: grid_from_rows(w.codes)?,
            scale: w.scale,
        })
    }
}

impl From<&SynthesisRequest> for InferenceBody {
    fn from(r: &SynthesisRequest) -> Self {
        Self {
            text_tokens: grid_to_rows(&r.text_tokens),
            text_tokens_lens: r.text_tokens_lens.clone(),
            audio_prompts: grid_to_rows(&r.audio_prompts),
            enroll_x_lens: r.enroll_x_lens,
            top_k: r.decoding.top_k,
            temperature: r.decoding.temperature,
            prompt_language: r.prompt_language.code(),
            text_language: r.text_language.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// SidecarClient
// ---------------------------------------------------------------------------

/// Shared connection to the sidecar.
#[derive(Debug, Clone)]
pub struct SidecarClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl SidecarClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| ModelError::Request(format!("invalid sidecar URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ModelError::Request(format!(
                "sidecar URL {base_url:?} must use http or https"
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ModelsConfig) -> Result<Self, ModelError> {
        Self::new(
            config.sidecar_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn send(
        &self,
        path: &str,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ModelError> {
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ModelError::Protocol(format!("{path}: HTTP {status}: {body}")));
        }
        Ok(resp)
    }

    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ModelError> {
        let resp = self.send(path, self.client.post(self.url(path)).json(body))?;
        resp.json::<R>()
            .map_err(|e| ModelError::Protocol(format!("{path}: {e}")))
    }

    pub fn health(&self) -> Result<Health, ModelError> {
        let path = "/v1/health";
        let resp = self.send(path, self.client.get(self.url(path)))?;
        resp.json::<Health>()
            .map_err(|e| ModelError::Protocol(format!("{path}: {e}")))
    }

    /// Fail unless the sidecar reports a fully loaded checkpoint.
    pub fn check_ready(&self) -> Result<(), ModelError> {
        let health = self.health()?;
        health_to_result(health)?;
        log::info!("models: sidecar at {} is ready", self.base_url);
        Ok(())
    }
}

fn health_to_result(health: Health) -> Result<(), ModelError> {
    if !health.missing_keys.is_empty() {
        return Err(ModelError::NotReady(health.missing_keys));
    }
    if !health.ready {
        return Err(ModelError::Protocol("sidecar reports not ready".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RemoteCodec
// ---------------------------------------------------------------------------

/// [`AudioCodec`] served by the sidecar.
#[derive(Debug, Clone)]
pub struct RemoteCodec {
    client: Arc<SidecarClient>,
}

impl RemoteCodec {
    pub fn new(client: Arc<SidecarClient>) -> Self {
        Self { client }
    }
}

impl AudioCodec for RemoteCodec {
    fn sample_rate(&self) -> u32 {
        CODEC_SAMPLE_RATE
    }

    fn encode(&self, waveform: &Waveform) -> Result<Vec<EncodedFrame>, ModelError> {
        let reply: EncodeReply = self.client.post_json(
            "/v1/codec/encode",
            &EncodeBody {
                sample_rate: waveform.sample_rate,
                samples: &waveform.samples,
            },
        )?;
        reply.frames.into_iter().map(EncodedFrame::try_from).collect()
    }

    fn decode(&self, frames: &[EncodedFrame]) -> Result<Waveform, ModelError> {
        let body = DecodeBody {
            frames: frames.iter().map(WireFrame::from).collect(),
        };
        let reply: DecodeReply = self.client.post_json("/v1/codec/decode", &body)?;
        if reply.samples.is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        Ok(Waveform::new(reply.samples, reply.sample_rate))
    }
}

// ---------------------------------------------------------------------------
// RemoteAcousticModel
// ---------------------------------------------------------------------------

/// [`AcousticModel`] served by the sidecar.
#[derive(Debug, Clone)]
pub struct RemoteAcousticModel {
    client: Arc<SidecarClient>,
}

impl RemoteAcousticModel {
    pub fn new(client: Arc<SidecarClient>) -> Self {
        Self { client }
    }
}

impl Placeable for RemoteAcousticModel {
    fn place(&self, placement: Placement) -> Result<(), ModelError> {
        let device = match placement {
            Placement::Active(d) => d,
            Placement::Offloaded => ComputeDevice::Cpu,
        };
        let path = "/v1/tts/placement";
        let body = PlacementBody {
            device: device.to_string(),
        };
        self.client
            .send(path, self.client.client.post(self.client.url(path)).json(&body))
            .map_err(|e| ModelError::Placement(e.to_string()))?;
        Ok(())
    }
}

impl AcousticModel for RemoteAcousticModel {
    fn inference(&self, request: &SynthesisRequest) -> Result<Array2<i64>, ModelError> {
        let reply: InferenceReply = self
            .client
            .post_json("/v1/tts/inference", &InferenceBody::from(request))?;
        let codes = grid_from_rows(reply.codes)?;
        if codes.is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Language;
    use crate::model::DecodingParams;
    use ndarray::array;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = SidecarClient::new("http://127.0.0.1:8765/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://127.0.0.1:8765");
        assert_eq!(c.url("/v1/health"), "http://127.0.0.1:8765/v1/health");
    }

    #[test]
    fn client_construction_errors_are_returned() {
        for bad in ["127.0.0.1:8765", "ftp://models.local", "not a url"] {
            assert!(
                matches!(
                    SidecarClient::new(bad, Duration::from_secs(1)),
                    Err(ModelError::Request(_))
                ),
                "{bad} should be rejected"
            );
        }
        let config = ModelsConfig::default();
        assert!(SidecarClient::from_config(&config).is_ok());
    }

    #[test]
    fn health_with_missing_keys_is_not_ready() {
        let h: Health =
            serde_json::from_str(r#"{"ready": false, "missing_keys": ["ar_decoder.w"]}"#).unwrap();
        match health_to_result(h) {
            Err(ModelError::NotReady(keys)) => assert_eq!(keys, vec!["ar_decoder.w"]),
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[test]
    fn health_ready_without_keys_field() {
        let h: Health = serde_json::from_str(r#"{"ready": true}"#).unwrap();
        assert!(health_to_result(h).is_ok());
    }

    #[test]
    fn inference_body_wire_shape() {
        let req = SynthesisRequest {
            text_tokens: array![[5_i64, 6, 7]],
            text_tokens_lens: vec![3],
            audio_prompts: array![[1_i64, 2], [3, 4]],
            enroll_x_lens: Some(2),
            decoding: DecodingParams::default(),
            prompt_language: Language::Zh,
            text_language: Language::En,
        };
        let v = serde_json::to_value(InferenceBody::from(&req)).unwrap();
        assert_eq!(v["text_tokens"], serde_json::json!([[5, 6, 7]]));
        assert_eq!(v["audio_prompts"], serde_json::json!([[1, 2], [3, 4]]));
        assert_eq!(v["enroll_x_lens"], 2);
        assert_eq!(v["top_k"], -100);
        assert_eq!(v["prompt_language"], "zh");
        assert_eq!(v["text_language"], "en");
    }

    #[test]
    fn ragged_wire_frame_is_rejected() {
        let w = WireFrame {
            codes: vec![vec![1, 2], vec![3]],
            scale: None,
        };
        assert!(matches!(
            EncodedFrame::try_from(w),
            Err(ModelError::Shape(_))
        ));
    }

    #[test]
    fn unreachable_sidecar_is_a_request_error() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let c = SidecarClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(matches!(
            c.health(),
            Err(ModelError::Request(_) | ModelError::Timeout)
        ));
    }
}
