use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sih_backend::auth::{DummyUserVerifier, FirebaseTokenVerifier, TokenVerifier};
use sih_backend::config::{self, AppConfig};
use sih_backend::firebase::FirebaseApp;
use sih_backend::llm::GeminiClient;
use sih_backend::services::chat_service::load_system_prompt;
use sih_backend::storage::CloudStorage;
use sih_backend::store::FirestoreStore;
use sih_backend::{app, AppState};

#[derive(Parser)]
#[command(name = "sih-backend")]
#[command(about = "Bookings, hospitality listings and chatbot API")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Bind address (overrides HOST)")]
    host: Option<String>,

    #[arg(long, help = "Bind port (overrides PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up FIREBASE_* and GOOGLE_API_KEY
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config: AppConfig = config::config().clone();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::info!("Starting SIH backend in {:?} mode", config.environment);

    // Credentials are only read on first use; a missing key does not stop startup.
    let firebase = Arc::new(FirebaseApp::configure(config.firebase.clone()));

    let verifier: Arc<dyn TokenVerifier> = if config.dev.use_dummy_user {
        tracing::warn!(
            "DEV_USE_DUMMY_USER is set: every bearer token authenticates as {}",
            config.dev.dummy_user_uid
        );
        Arc::new(DummyUserVerifier::new(
            config.dev.dummy_user_uid.clone(),
            config.dev.dummy_user_email.clone(),
        ))
    } else {
        Arc::new(FirebaseTokenVerifier::new(firebase.clone()))
    };

    if config.chatbot.google_api_key.is_none() {
        tracing::warn!("GOOGLE_API_KEY not set; chatbot replies will report the missing key");
    }
    let model = Arc::new(GeminiClient::new(
        config.chatbot.google_api_key.clone(),
        config.chatbot.gemini_model.clone(),
    ));
    let system_prompt = load_system_prompt(&config.chatbot.system_prompt_path).await;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(
        config.clone(),
        Arc::new(FirestoreStore::new(firebase.clone())),
        Arc::new(CloudStorage::new(firebase, config.firebase.storage_bucket.clone())),
        verifier,
        model,
        system_prompt,
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}
