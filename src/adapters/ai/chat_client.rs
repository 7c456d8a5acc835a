//! Streaming chat client - `reqwest` implementation of [`ChatStreamClient`].
//!
//! POSTs the conversation history to the provider and decodes the SSE body
//! into [`StreamEvent`]s with [`SseFrameDecoder`]. Malformed frames are
//! dropped by the decoder; transport failures surface as `Err` items.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ChatClientConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let client = HttpChatClient::new(config);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

use crate::domain::conversation::{ChatMode, SseFrameDecoder, StreamEvent, StreamTransportError};
use crate::ports::{ChatRequest, ChatStreamClient, EventStream, ProviderMessage};

/// Configuration for the streaming chat client.
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to request.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Connect timeout. The body stream itself is not bounded, a response
    /// may take minutes to finish.
    pub connect_timeout: Duration,
}

impl ChatClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
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

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// HTTP chat client speaking the provider's streaming protocol.
pub struct HttpChatClient {
    config: ChatClientConfig,
    client: Client,
}

impl HttpChatClient {
    /// Creates a new chat client with the given configuration.
    ///
    /// Only the connect phase is bounded by a timeout; a streaming body
    /// must be allowed to run as long as the completion takes.
    pub fn new(config: ChatClientConfig) -> Result<Self, StreamTransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamTransportError::connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &ChatRequest) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            messages: request.messages.clone(),
            mode: request.mode,
            stream: true,
        }
    }

    async fn handle_response_status(response: Response) -> Result<Response, StreamTransportError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(StreamTransportError::AuthenticationFailed),
            429 => Err(StreamTransportError::RateLimited),
            code => Err(StreamTransportError::status(code, body)),
        }
    }
}

#[async_trait]
impl ChatStreamClient for HttpChatClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream, StreamTransportError> {
        let wire_request = self.to_wire_request(&request);

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Accept", "text/event-stream")
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| StreamTransportError::connection(e.to_string()))?;

        let response = Self::handle_response_status(response).await?;

        Ok(Box::pin(decode_frames(response.bytes_stream())))
    }
}

/// Decodes a raw SSE byte stream into [`StreamEvent`]s.
///
/// Chunk boundaries do not align with frame boundaries, so a stateful
/// decoder carries partial lines between chunks and flushes any trailing
/// unterminated line when the body ends.
fn decode_frames<S>(bytes: S) -> impl Stream<Item = Result<StreamEvent, StreamTransportError>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    struct DecodeState<S> {
        bytes: S,
        decoder: SseFrameDecoder,
        pending: VecDeque<Result<StreamEvent, StreamTransportError>>,
        done: bool,
    }

    let state = DecodeState {
        bytes,
        decoder: SseFrameDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.pending.extend(st.decoder.feed(&chunk).into_iter().map(Ok));
                }
                Some(Err(e)) => {
                    st.pending
                        .push_back(Err(StreamTransportError::connection(e.to_string())));
                    st.done = true;
                }
                None => {
                    st.pending.extend(st.decoder.finish().into_iter().map(Ok));
                    st.done = true;
                }
            }
        }
    })
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<ProviderMessage>,
    mode: ChatMode,
    stream: bool,
}
