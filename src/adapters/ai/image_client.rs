//! Image generation clients.
//!
//! [`HttpImageClient`] speaks to one provider credential.
//! [`FailoverImageGenerator`] wraps an ordered list of clients and walks
//! down the chain whenever a credential reports an exhausted budget; every
//! other error stops the chain and surfaces to the caller.
//!
//! # Example
//!
//! ```ignore
//! let generator = FailoverImageGenerator::new(vec![
//!     Box::new(HttpImageClient::new(ImageClientConfig::new(key_a))?),
//!     Box::new(HttpImageClient::new(ImageClientConfig::new(key_b))?),
//! ]);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::conversation::{GeneratedImage, ImagePayload, MAX_REFERENCE_IMAGES};
use crate::ports::{ImageError, ImageGenerator};

/// Configuration for one image provider credential.
#[derive(Debug, Clone)]
pub struct ImageClientConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to request.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout. Image generation is slow; give it room.
    pub timeout: Duration,
}

impl ImageClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-image-1".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(180),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Image client bound to one provider credential.
pub struct HttpImageClient {
    config: ImageClientConfig,
    client: Client,
}

impl HttpImageClient {
    /// Creates a new image client with the given configuration.
    pub fn new(config: ImageClientConfig) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ImageError::network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn generations_url(&self) -> String {
        format!("{}/images/generations", self.config.base_url)
    }

    fn edits_url(&self) -> String {
        format!("{}/images/edits", self.config.base_url)
    }

    async fn post(&self, url: String, body: &impl Serialize) -> Result<Response, ImageError> {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ImageError::network("request timed out")
                } else {
                    ImageError::network(e.to_string())
                }
            })
    }

    async fn parse_response(response: Response) -> Result<GeneratedImage, ImageError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => ImageError::AuthenticationFailed,
                // Providers report a spent budget as 402, or as a billing
                // error in the 400/429 body.
                402 => ImageError::BudgetExhausted,
                400 | 429 if is_budget_error(&body) => ImageError::BudgetExhausted,
                400 => ImageError::Rejected(body),
                code => ImageError::network(format!("unexpected status {}: {}", code, body)),
            });
        }

        let wire: WireImageResponse = response
            .json()
            .await
            .map_err(|e| ImageError::parse(e.to_string()))?;

        if wire.data.is_empty() {
            return Err(ImageError::parse("no images in response"));
        }

        let content = wire
            .data
            .first()
            .and_then(|d| d.revised_prompt.clone())
            .unwrap_or_default();
        let images = wire
            .data
            .into_iter()
            .map(|d| ImagePayload::new(d.b64_json, "image/png"))
            .collect();

        Ok(GeneratedImage { content, images })
    }
}

/// True when an error body describes a spent budget rather than a bad
/// request.
fn is_budget_error(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("billing_hard_limit_reached")
        || body.contains("insufficient_quota")
        || body.contains("budget")
}

#[async_trait]
impl ImageGenerator for HttpImageClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        if prompt.trim().is_empty() {
            return Err(ImageError::InvalidRequest("empty prompt".to_string()));
        }

        let request = WireGenerationRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
        };
        let response = self.post(self.generations_url(), &request).await?;
        Self::parse_response(response).await
    }

    async fn edit(
        &self,
        prompt: &str,
        references: &[ImagePayload],
    ) -> Result<GeneratedImage, ImageError> {
        if prompt.trim().is_empty() {
            return Err(ImageError::InvalidRequest("empty prompt".to_string()));
        }
        if references.is_empty() || references.len() > MAX_REFERENCE_IMAGES {
            return Err(ImageError::InvalidRequest(format!(
                "reference image count must be 1-{}, got {}",
                MAX_REFERENCE_IMAGES,
                references.len()
            )));
        }

        let request = WireEditRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            image: references.to_vec(),
        };
        let response = self.post(self.edits_url(), &request).await?;
        Self::parse_response(response).await
    }
}

/// Ordered credential chain for image generation.
///
/// Requests go to the first client; a `BudgetExhausted` response moves to
/// the next credential without surfacing anything to the caller. Only when
/// every credential is spent does `BudgetExhausted` propagate.
pub struct FailoverImageGenerator {
    clients: Vec<Box<dyn ImageGenerator>>,
}

impl FailoverImageGenerator {
    /// Creates a failover chain from an ordered list of clients.
    pub fn new(clients: Vec<Box<dyn ImageGenerator>>) -> Self {
        Self { clients }
    }

    async fn try_chain<'a, F, Fut>(&'a self, mut attempt: F) -> Result<GeneratedImage, ImageError>
    where
        F: FnMut(&'a dyn ImageGenerator) -> Fut,
        Fut: std::future::Future<Output = Result<GeneratedImage, ImageError>> + 'a,
    {
        if self.clients.is_empty() {
            return Err(ImageError::InvalidRequest(
                "no image credentials configured".to_string(),
            ));
        }

        let last = self.clients.len() - 1;
        for (index, client) in self.clients.iter().enumerate() {
            match attempt(client.as_ref()).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_budget_exhausted() && index < last => {
                    tracing::warn!(
                        credential_index = index,
                        "image credential budget exhausted, trying next"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(ImageError::BudgetExhausted)
    }
}

#[async_trait]
impl ImageGenerator for FailoverImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError> {
        self.try_chain(|client| client.generate(prompt)).await
    }

    async fn edit(
        &self,
        prompt: &str,
        references: &[ImagePayload],
    ) -> Result<GeneratedImage, ImageError> {
        self.try_chain(|client| client.edit(prompt, references))
            .await
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct WireGenerationRequest {
    model: String,
    prompt: String,
    n: u8,
}

#[derive(Debug, Serialize)]
struct WireEditRequest {
    model: String,
    prompt: String,
    image: Vec<ImagePayload>,
}

#[derive(Debug, Deserialize)]
struct WireImageResponse {
    data: Vec<WireImageData>,
}

#[derive(Debug, Deserialize)]
struct WireImageData {
    b64_json: String,
    revised_prompt: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedGenerator {
        result: Result<GeneratedImage, ImageError>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedGenerator {
        fn new(result: Result<GeneratedImage, ImageError>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    result,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl ImageGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, ImageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn edit(
            &self,
            prompt: &str,
            _references: &[ImagePayload],
        ) -> Result<GeneratedImage, ImageError> {
            self.generate(prompt).await
        }
    }

    fn sample_image() -> GeneratedImage {
        GeneratedImage {
            content: "a fox".to_string(),
            images: vec![ImagePayload::new("aGVsbG8=", "image/png")],
        }
    }

    #[tokio::test]
    async fn budget_exhaustion_cascades_to_next_credential() {
        let (spent, spent_calls) = ScriptedGenerator::new(Err(ImageError::BudgetExhausted));
        let (live, live_calls) = ScriptedGenerator::new(Ok(sample_image()));

        let chain = FailoverImageGenerator::new(vec![Box::new(spent), Box::new(live)]);
        let result = chain.generate("a fox").await.unwrap();

        assert_eq!(result.images.len(), 1);
        assert_eq!(spent_calls.load(Ordering::SeqCst), 1);
        assert_eq!(live_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_budget_error_stops_the_chain() {
        let (broken, _) = ScriptedGenerator::new(Err(ImageError::Rejected("policy".to_string())));
        let (live, live_calls) = ScriptedGenerator::new(Ok(sample_image()));

        let chain = FailoverImageGenerator::new(vec![Box::new(broken), Box::new(live)]);
        let result = chain.generate("a fox").await;

        assert!(matches!(result, Err(ImageError::Rejected(_))));
        assert_eq!(live_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_credentials_spent_surfaces_budget_error() {
        let (a, _) = ScriptedGenerator::new(Err(ImageError::BudgetExhausted));
        let (b, _) = ScriptedGenerator::new(Err(ImageError::BudgetExhausted));

        let chain = FailoverImageGenerator::new(vec![Box::new(a), Box::new(b)]);
        let result = chain.generate("a fox").await;

        assert!(matches!(result, Err(ImageError::BudgetExhausted)));
    }

    #[tokio::test]
    async fn empty_chain_is_invalid() {
        let chain = FailoverImageGenerator::new(vec![]);
        let result = chain.generate("a fox").await;
        assert!(matches!(result, Err(ImageError::InvalidRequest(_))));
    }

    #[test]
    fn budget_body_detection() {
        assert!(is_budget_error(r#"{"error":{"code":"insufficient_quota"}}"#));
        assert!(is_budget_error("Billing_Hard_Limit_Reached"));
        assert!(!is_budget_error(r#"{"error":{"code":"invalid_prompt"}}"#));
    }
}
