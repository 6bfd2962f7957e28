use clap::Parser;
use ollama_proxy::{build_router, AppState, ModelRegistry, ProxyConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "ollama-proxy",
    about = "Ollama-compatible API proxy — serve OpenAI-schema providers to Ollama clients",
    version
)]
struct Cli {
    /// Address to bind (overrides HOST_SERVE)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT_SERVE)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_loaded = match cli.env_file {
        Some(ref path) => dotenvy::from_filename(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ollama_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = env_loaded {
        warn!(error = %e, "no .env file loaded, using process environment");
    }

    let mut config = ProxyConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let registry = Arc::new(ModelRegistry::new(config.backends.clone(), client.clone()));

    info!("Starting ollama-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Backends: {} configured", config.backends.len());
    for backend in &config.backends {
        info!("    {}", backend.endpoint);
    }

    // Warm the model list so /api/tags answers immediately.
    if let Err(e) = registry.refresh().await {
        warn!(error = %e, "initial model scan failed, registry starts empty");
    }

    let state = Arc::new(AppState {
        registry,
        client,
    });

    let app = build_router(state);
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
