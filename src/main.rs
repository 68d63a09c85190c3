use std::process::ExitCode;
use std::sync::Arc;
use video_agent::config::AppConfig;
use video_agent::{build_router, AppState, StartupError};

const ROUTES: [&str; 7] = [
    "GET /health",
    "POST /graph",
    "GET /graph/:thread_id",
    "POST /mcq",
    "POST /conversation",
    "POST /chat",
    "POST /chat/:thread_id/resume",
];

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    let bind_addr = config.server.bind_addr.clone();

    tracing::info!(
        "Configuration - LLM: {} ({}), Video API: {}, Database: {}, AWS: {}",
        config.llm.provider,
        config.llm.model,
        config.video_api.base_url,
        if config.database_url.is_some() { "✅" } else { "❌" },
        if config.storage.aws_access_key.is_some() { "✅" } else { "❌" }
    );

    for dir in [&config.storage.temp_file_path, &config.storage.mcq_files_path] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create {} directory: {}", dir, e);
        }
    }

    let state = Arc::new(AppState::from_config(config).await?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    tracing::info!("🎬 Agent is running on http://{}", bind_addr);
    for route in ROUTES {
        tracing::info!("Route: {}", route);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Agent is shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,video_agent=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,video_agent=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("🎬 Video agent starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
