//! Text-to-speech client.
//!
//! The provider may answer with a raw audio body or with a JSON envelope
//! carrying base64 audio; both shapes are normalized to one byte buffer
//! before leaving the adapter.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{SpeechError, SpeechSynthesizer};

const MAX_SPEECH_INPUT_CHARS: usize = 4096;

/// Configuration for the speech synthesis client.
#[derive(Debug, Clone)]
pub struct SpeechClientConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to request.
    pub model: String,
    /// Voice to synthesize with.
    pub voice: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl SpeechClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Speech synthesis client.
pub struct HttpSpeechSynthesizer {
    config: SpeechClientConfig,
    client: Client,
}

impl HttpSpeechSynthesizer {
    /// Creates a new synthesizer with the given configuration.
    pub fn new(config: SpeechClientConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::Rejected("empty text".to_string()));
        }
        if text.chars().count() > MAX_SPEECH_INPUT_CHARS {
            return Err(SpeechError::Rejected(format!(
                "text exceeds {} characters",
                MAX_SPEECH_INPUT_CHARS
            )));
        }

        let request = WireSpeechRequest {
            model: self.config.model.clone(),
            voice: self.config.voice.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(self.speech_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 => SpeechError::Rejected(body),
                code => SpeechError::Network(format!("status {}: {}", code, body)),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        normalize_audio_body(&content_type, body)
    }
}

/// Normalizes the provider body to raw audio bytes.
///
/// JSON bodies carry base64 audio under `audio` or `data`; anything else
/// is treated as the audio itself.
fn normalize_audio_body(content_type: &str, body: Bytes) -> Result<Bytes, SpeechError> {
    if !content_type.starts_with("application/json") {
        if body.is_empty() {
            return Err(SpeechError::Parse("empty audio body".to_string()));
        }
        return Ok(body);
    }

    let wire: WireSpeechResponse =
        serde_json::from_slice(&body).map_err(|e| SpeechError::Parse(e.to_string()))?;
    let encoded = wire
        .audio
        .or(wire.data)
        .ok_or_else(|| SpeechError::Parse("no audio field in response".to_string()))?;

    BASE64
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(|e| SpeechError::Parse(format!("invalid base64 audio: {}", e)))
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct WireSpeechRequest {
    model: String,
    voice: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct WireSpeechResponse {
    audio: Option<String>,
    data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_audio_body_passes_through() {
        let body = Bytes::from_static(b"RIFF....WAVE");
        let audio = normalize_audio_body("audio/mpeg", body.clone()).unwrap();
        assert_eq!(audio, body);
    }

    #[test]
    fn json_body_decodes_base64_audio() {
        let body = Bytes::from_static(br#"{"audio":"aGVsbG8="}"#);
        let audio = normalize_audio_body("application/json", body).unwrap();
        assert_eq!(audio, Bytes::from_static(b"hello"));
    }

    #[test]
    fn json_body_accepts_data_field() {
        let body = Bytes::from_static(br#"{"data":"aGVsbG8="}"#);
        let audio = normalize_audio_body("application/json", body).unwrap();
        assert_eq!(audio, Bytes::from_static(b"hello"));
    }

    #[test]
    fn json_body_without_audio_is_a_parse_error() {
        let body = Bytes::from_static(br#"{"status":"ok"}"#);
        assert!(matches!(
            normalize_audio_body("application/json", body),
            Err(SpeechError::Parse(_))
        ));
    }

    #[test]
    fn empty_raw_body_is_a_parse_error() {
        assert!(matches!(
            normalize_audio_body("audio/mpeg", Bytes::new()),
            Err(SpeechError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_request() {
        let config = SpeechClientConfig::new("test-key");
        let synthesizer = HttpSpeechSynthesizer::new(config).unwrap();

        let result = synthesizer.synthesize("   ").await;
        assert!(matches!(result, Err(SpeechError::Rejected(_))));
    }
}
