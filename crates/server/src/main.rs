mod app;
mod error;
mod handlers;
mod state;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use pdf_qa_core::{ChatModel, GroqChatModel, LopdfExtractor, DEFAULT_CHAT_MODEL};
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa-server", version)]
struct Cli {
    /// Address to bind the HTTP server on.
    #[arg(long, env = "PDF_QA_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Directory holding the persisted chunk index.
    #[arg(long, env = "PDF_QA_INDEX_DIR", default_value = "chunk_index")]
    index_dir: PathBuf,

    /// Chat model used for answer generation.
    #[arg(long, env = "PDF_QA_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let model: Option<Arc<dyn ChatModel>> = match GroqChatModel::from_env(&cli.chat_model) {
        Ok(model) => Some(Arc::new(model)),
        Err(error) => {
            warn!(%error, "chat model unavailable; queries will return 503 until configured");
            None
        }
    };

    let state = AppState::new(cli.index_dir.clone(), Arc::new(LopdfExtractor), model);

    // Process boundary: pick up a previously persisted index before serving.
    state.initialize_pipeline().await;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        bind = %cli.bind,
        index_dir = %cli.index_dir.display(),
        ready = state.is_ready().await,
        "pdf-qa-server boot"
    );

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    axum::serve(listener, app::create_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    Ok(())
}
