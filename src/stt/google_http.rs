//! Google web speech backend — raw PCM POST to the speech-api v2 endpoint.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use super::{RecognizeError, Recognizer};
use crate::config::SttConfig;

/// Recognizes phrases through the Google web speech API, the same endpoint
/// the Chromium browser uses for voice input.
pub struct GoogleHttpRecognizer {
    endpoint: String,
    api_key: String,
    agent: ureq::Agent,
}

impl GoogleHttpRecognizer {
    pub fn new(cfg: &SttConfig) -> Self {
        let endpoint = cfg.endpoint.trim_end_matches('/').to_string();
        log::info!("GoogleHttpRecognizer: endpoint {endpoint}");
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build();
        Self {
            endpoint,
            api_key: cfg.api_key.clone(),
            agent,
        }
    }
}

impl Recognizer for GoogleHttpRecognizer {
    fn recognize(&self, wav_path: &Path, language: &str) -> Result<String, RecognizeError> {
        let (pcm, sample_rate) = read_wav_as_s16le(wav_path)?;

        let url = format!(
            "{}?client=chromium&output=json&lang={}&key={}",
            self.endpoint, language, self.api_key
        );
        let resp = self
            .agent
            .post(&url)
            .set("Content-Type", &format!("audio/l16; rate={sample_rate}"))
            .send_bytes(&pcm)
            .context("speech request failed")?;

        let body = resp
            .into_string()
            .context("failed to read speech response")?;
        log::debug!("Speech response: {body:?}");

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "Google web speech"
    }

    fn is_available(&self) -> bool {
        // Outbound-only API with no health endpoint; assume reachable.
        true
    }
}

/// The endpoint streams one JSON object per line; the first is usually an
/// empty `{"result":[]}` placeholder. Take the first line with a non-empty
/// result and return its best alternative's transcript.
fn parse_response(body: &str) -> Result<String, RecognizeError> {
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value =
            serde_json::from_str(line).context("malformed speech response line")?;
        let Some(results) = value["result"].as_array() else {
            continue;
        };
        if results.is_empty() {
            continue;
        }
        let transcript = results[0]["alternative"]
            .as_array()
            .and_then(|alts| alts.first())
            .and_then(|alt| alt["transcript"].as_str());
        if let Some(text) = transcript {
            let text = text.trim();
            if !text.is_empty() {
                return Ok(text.to_string());
            }
        }
    }
    Err(RecognizeError::Unintelligible)
}

/// Load a WAV and return raw s16le bytes plus the sample rate.
fn read_wav_as_s16le(path: &Path) -> Result<(Vec<u8>, u32)> {
    let mut reader = hound::WavReader::open(path).context("open WAV")?;
    let spec = reader.spec();
    let mut bytes = Vec::with_capacity(reader.len() as usize * 2);
    match spec.sample_format {
        hound::SampleFormat::Int => {
            for sample in reader.samples::<i16>() {
                bytes.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.samples::<f32>() {
                let s16 = (sample? * 32767.0).clamp(-32768.0, 32767.0) as i16;
                bytes.extend_from_slice(&s16.to_le_bytes());
            }
        }
    }
    Ok((bytes, spec.sample_rate))
}
