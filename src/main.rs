//! Parley server binary.
//!
//! Loads configuration from the environment, wires the provider clients
//! and Postgres repositories into the application state, and serves the
//! HTTP API.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parley::adapters::ai::{
    ChatClientConfig, FailoverImageGenerator, HttpChatClient, HttpImageClient,
    HttpSpeechSynthesizer, HttpTranscriber, ImageClientConfig, SpeechClientConfig,
    TranscriptionClientConfig,
};
use parley::adapters::auth::{JwtTokenVerifier, JwtVerifierConfig};
use parley::adapters::http::{app_router, AppState};
use parley::adapters::postgres::{
    PostgresConversationRepository, PostgresEngagementRepository, PostgresFolderRepository,
    PostgresShareRepository,
};
use parley::config::AppConfig;
use parley::ports::ImageGenerator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Validation guarantees a chat key is present.
    let chat_key = config.ai.chat_api_key.clone().unwrap_or_default();

    let chat = HttpChatClient::new(
        ChatClientConfig::new(chat_key.clone())
            .with_model(config.ai.chat_model.clone())
            .with_base_url(config.ai.chat_base_url.clone()),
    )?;

    // Ordered credential chain; exhaustion of one budget silently moves to
    // the next.
    let mut image_clients: Vec<Box<dyn ImageGenerator>> = Vec::new();
    for key in config.ai.image_key_list() {
        image_clients.push(Box::new(HttpImageClient::new(
            ImageClientConfig::new(key)
                .with_model(config.ai.image_model.clone())
                .with_base_url(config.ai.image_base_url.clone()),
        )?));
    }
    let images = FailoverImageGenerator::new(image_clients);

    let transcriber = HttpTranscriber::new(
        TranscriptionClientConfig::new(chat_key.clone())
            .with_model(config.ai.transcription_model.clone())
            .with_fallback_model(config.ai.transcription_fallback_model.clone())
            .with_base_url(config.ai.chat_base_url.clone()),
    )?;

    let speech = HttpSpeechSynthesizer::new(
        SpeechClientConfig::new(chat_key)
            .with_model(config.ai.speech_model.clone())
            .with_voice(config.ai.speech_voice.clone())
            .with_base_url(config.ai.chat_base_url.clone()),
    )?;

    let mut jwt_config = JwtVerifierConfig::new(config.auth.jwt_secret.clone());
    if let Some(issuer) = &config.auth.issuer {
        jwt_config = jwt_config.with_issuer(issuer.clone());
    }
    if let Some(audience) = &config.auth.audience {
        jwt_config = jwt_config.with_audience(audience.clone());
    }
    jwt_config.leeway_secs = config.auth.leeway_secs;

    let state = AppState {
        conversations: Arc::new(PostgresConversationRepository::new(pool.clone())),
        folders: Arc::new(PostgresFolderRepository::new(pool.clone())),
        engagement: Arc::new(PostgresEngagementRepository::new(pool.clone())),
        shares: Arc::new(PostgresShareRepository::new(pool)),
        chat: Arc::new(chat),
        images: Arc::new(images),
        transcriber: Arc::new(transcriber),
        speech: Arc::new(speech),
        token_verifier: Arc::new(JwtTokenVerifier::new(jwt_config)),
    };

    let app = app_router(state, &config.server);
    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
