//! Audio transcription client.
//!
//! Sends the audio blob as a multipart upload. The primary model gets one
//! attempt; on any failure the fallback model gets one attempt; only after
//! both fail does the error surface as `AllModelsFailed`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::ports::{Transcriber, TranscriptionError};

/// Configuration for the transcription client.
#[derive(Debug, Clone)]
pub struct TranscriptionClientConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Primary transcription model.
    pub model: String,
    /// Fallback model tried when the primary fails.
    pub fallback_model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl TranscriptionClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-transcribe".to_string(),
            fallback_model: "whisper-1".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the primary model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the fallback model.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
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

/// Transcription client with a primary and a fallback model.
pub struct HttpTranscriber {
    config: TranscriptionClientConfig,
    client: Client,
}

impl HttpTranscriber {
    /// Creates a new transcriber with the given configuration.
    pub fn new(config: TranscriptionClientConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn transcriptions_url(&self) -> String {
        format!("{}/audio/transcriptions", self.config.base_url)
    }

    /// File name hint for the multipart part, derived from the media type.
    fn file_name(media_type: &str) -> &'static str {
        match media_type {
            "audio/mpeg" | "audio/mp3" => "audio.mp3",
            "audio/wav" | "audio/x-wav" => "audio.wav",
            "audio/ogg" => "audio.ogg",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "audio.m4a",
            _ => "audio.webm",
        }
    }

    async fn transcribe_with_model(
        &self,
        model: &str,
        audio: Bytes,
        media_type: &str,
    ) -> Result<String, TranscriptionError> {
        let part = Part::stream(audio)
            .file_name(Self::file_name(media_type))
            .mime_str(media_type)
            .map_err(|e| TranscriptionError::Rejected(format!("bad media type: {}", e)))?;
        let form = Form::new()
            .text("model", model.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.transcriptions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                400 | 413 | 415 => TranscriptionError::Rejected(body),
                code => TranscriptionError::Network(format!("status {}: {}", code, body)),
            });
        }

        let wire: WireTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        Ok(wire.text)
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: Bytes,
        media_type: &str,
    ) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::Rejected("empty audio".to_string()));
        }

        let primary_err = match self
            .transcribe_with_model(&self.config.model, audio.clone(), media_type)
            .await
        {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        tracing::warn!(
            model = %self.config.model,
            fallback = %self.config.fallback_model,
            error = %primary_err,
            "primary transcription model failed, trying fallback"
        );

        self.transcribe_with_model(&self.config.fallback_model, audio, media_type)
            .await
            .map_err(|fallback_err| {
                TranscriptionError::AllModelsFailed(format!(
                    "{} ({}); {} ({})",
                    self.config.model, primary_err, self.config.fallback_model, fallback_err
                ))
            })
    }
}

// ----- Wire Types -----

#[derive(Debug, Deserialize)]
struct WireTranscription {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = TranscriptionClientConfig::new("test-key")
            .with_model("primary-model")
            .with_fallback_model("fallback-model")
            .with_base_url("https://custom.api.com/v1");

        assert_eq!(config.model, "primary-model");
        assert_eq!(config.fallback_model, "fallback-model");
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn file_name_tracks_media_type() {
        assert_eq!(HttpTranscriber::file_name("audio/mpeg"), "audio.mp3");
        assert_eq!(HttpTranscriber::file_name("audio/wav"), "audio.wav");
        assert_eq!(HttpTranscriber::file_name("audio/webm"), "audio.webm");
        assert_eq!(HttpTranscriber::file_name("application/blob"), "audio.webm");
    }

    #[tokio::test]
    async fn empty_audio_is_rejected_before_any_request() {
        let config = TranscriptionClientConfig::new("test-key");
        let transcriber = HttpTranscriber::new(config).unwrap();

        let result = transcriber.transcribe(Bytes::new(), "audio/wav").await;
        assert!(matches!(result, Err(TranscriptionError::Rejected(_))));
    }
}
