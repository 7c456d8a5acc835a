//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Base URL of the chat completion provider
    #[serde(default = "default_chat_base_url")]
    pub chat_base_url: String,

    /// Chat API key
    pub chat_api_key: Option<String>,

    /// Chat model identifier
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Base URL of the image generation provider
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Comma-separated image API keys, tried in order when a key's
    /// budget is exhausted
    #[serde(default)]
    pub image_api_keys: Option<String>,

    /// Image model identifier
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Primary transcription model
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Fallback transcription model, tried when the primary rejects
    /// the request
    #[serde(default = "default_transcription_fallback_model")]
    pub transcription_fallback_model: String,

    /// Speech synthesis model
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// Speech synthesis voice
    #[serde(default = "default_speech_voice")]
    pub speech_voice: String,

    /// Request timeout in seconds (streaming requests are exempt)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Image API keys as an ordered failover list
    pub fn image_key_list(&self) -> Vec<String> {
        self.image_api_keys
            .as_deref()
            .map(|keys| {
                keys.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if the chat provider is configured
    pub fn has_chat(&self) -> bool {
        self.chat_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if image generation is configured
    pub fn has_images(&self) -> bool {
        !self.image_key_list().is_empty()
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_chat() {
            return Err(ValidationError::MissingRequired("AI__CHAT_API_KEY"));
        }
        if !self.chat_base_url.starts_with("http://") && !self.chat_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidProviderUrl);
        }
        if !self.image_base_url.starts_with("http://")
            && !self.image_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidProviderUrl);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            chat_base_url: default_chat_base_url(),
            chat_api_key: None,
            chat_model: default_chat_model(),
            image_base_url: default_image_base_url(),
            image_api_keys: None,
            image_model: default_image_model(),
            transcription_model: default_transcription_model(),
            transcription_fallback_model: default_transcription_fallback_model(),
            speech_model: default_speech_model(),
            speech_voice: default_speech_voice(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_image_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_image_model() -> String {
    "gpt-image-1".to_string()
}

fn default_transcription_model() -> String {
    "gpt-4o-transcribe".to_string()
}

fn default_transcription_fallback_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_speech_voice() -> String {
    "alloy".to_string()
}

fn default_timeout() -> u64 {
    120
}
