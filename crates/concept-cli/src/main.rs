//! `conceptd`: serves the daily-concept API and exposes the input sanitizers
//! on the command line.

mod config;

use crate::config::{ConceptdConfig, StoreBackend};
use clap::{Parser, Subcommand, ValueEnum};
use concept_agent::{ConceptGenerator, LlmClient};
use concept_gateway::{AppState, GatewayServer};
use concept_security::{
    sanitize, sanitize_for_prompt, sanitize_html, validate_identifier, PasswordHasher,
    RateLimiter, TokenIssuer,
};
use concept_store::{FileUserStore, MemoryUserStore, UserStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conceptd", about = "Daily concept server")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "conceptd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one sanitizer over an input and print the result
    Sanitize {
        mode: SanitizeMode,
        input: String,
        /// Length limit for `text` and `html`
        #[arg(long)]
        max_length: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SanitizeMode {
    /// Short free text (names, categories, interests)
    Text,
    /// Text shown as HTML
    Html,
    /// Text placed in a model prompt
    Prompt,
    /// A 24-hex-character user id
    Id,
}

fn run_sanitizer(
    mode: SanitizeMode,
    input: &str,
    max_length: Option<usize>,
) -> anyhow::Result<String> {
    let out = match mode {
        SanitizeMode::Text => sanitize(input, max_length.unwrap_or(50))?,
        SanitizeMode::Html => sanitize_html(input, max_length.unwrap_or(2000))?,
        SanitizeMode::Prompt => sanitize_for_prompt(input)?,
        SanitizeMode::Id => validate_identifier(input)?.to_hex(),
    };
    Ok(out)
}

async fn serve(config: ConceptdConfig, host: String, port: u16) -> anyhow::Result<()> {
    let tokens = TokenIssuer::new(&config.security.jwt_secret)
        .map_err(|e| anyhow::anyhow!("{e} (set JWT_SECRET_KEY)"))?;
    if config.model.api_key.is_empty() {
        warn!("No model API key configured (OPENROUTER_API_KEY); concept requests will fail");
    }

    let store: Arc<dyn UserStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory user store; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
        StoreBackend::File => {
            let dir = config.data_dir.join("users");
            info!(dir = %dir.display(), "Using file user store");
            Arc::new(FileUserStore::new(dir).await?)
        }
    };

    let limiter = Arc::new(RateLimiter::new(
        config.security.rate_limit_requests,
        Duration::from_secs(config.security.rate_limit_window_secs),
    ));
    let sweeper = Arc::clone(&limiter);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweeper.window().max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            sweeper.cleanup().await;
        }
    });

    info!(
        model = %config.model.model_id,
        provider = ?config.model.provider,
        "Model configured"
    );
    let state = Arc::new(AppState {
        store,
        generator: Arc::new(ConceptGenerator::new(LlmClient::new(config.model))),
        tokens,
        passwords: PasswordHasher::new(config.security.password_rounds),
        public_limiter: limiter,
    });
    let app = GatewayServer::build(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("conceptd listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
        }
    })
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = ConceptdConfig::load(&cli.config).await?;
            config.apply_env(|name| std::env::var(name).ok());

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            info!("Starting conceptd on {}:{}", host, port);
            serve(config, host, port).await?;
        }
        Commands::Sanitize {
            mode,
            input,
            max_length,
        } => {
            println!("{}", run_sanitizer(mode, &input, max_length)?);
        }
    }

    Ok(())
}
