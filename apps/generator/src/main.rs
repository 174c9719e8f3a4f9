mod config;
mod curriculum;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod planning;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::curriculum::lookup::PgLookupService;
use crate::db::create_pool;
use crate::generation::handlers::parse_request;
use crate::generation::orchestrator::{assemble, AssemblyOptions};
use crate::generation::service::LlmGenerationService;
use crate::llm_client::LlmClient;
use crate::models::request::{ContentRequest, RawContentRequest};
use crate::planning::aggregator::{render_report, summarize};
use crate::planning::planner::plan;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "generator")]
#[command(about = "English test content generator for Korean middle school grades")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Print the distribution plan for a request without calling the model
    Plan {
        /// JSON request file (default: built-in grade-2 sample)
        #[arg(short, long)]
        request: Option<PathBuf>,
    },

    /// Plan and generate a full bundle, printed as JSON
    Generate {
        /// JSON request file (default: built-in grade-2 sample)
        #[arg(short, long)]
        request: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = Config::from_env()?;
            init_tracing(&config.rust_log);
            serve(config).await
        }
        Commands::Plan { request } => {
            init_tracing("info");
            let request = load_request(request.as_deref())?;
            let plan = plan(&request)?;
            let summary = summarize(&plan.items);
            println!("{}", render_report(&plan, &summary));
            Ok(())
        }
        Commands::Generate { request } => {
            let config = Config::from_env()?;
            init_tracing(&config.rust_log);
            let request = load_request(request.as_deref())?;
            generate(config, request).await
        }
    }
}

/// Structured logging: `RUST_LOG` wins, else `generator=<level>`.
fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_request(path: Option<&Path>) -> Result<ContentRequest> {
    let body = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("request file {} is not valid JSON", path.display()))?
        }
        None => serde_json::to_value(RawContentRequest::sample())?,
    };
    Ok(parse_request(body)?)
}

async fn build_state(config: Config) -> Result<AppState> {
    let db = create_pool(&config.database_url).await?;
    let lookup = Arc::new(PgLookupService::new(db));

    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());
    let generator = Arc::new(LlmGenerationService::new(llm));

    let assembly = AssemblyOptions::from_config(&config);
    info!(
        "Assembly: concurrency {}, item timeout {:?}, stage timeout {:?}, run deadline {:?}",
        assembly.concurrency, assembly.item_timeout, assembly.stage_timeout, assembly.run_deadline
    );

    Ok(AppState {
        lookup,
        generator,
        assembly,
        config,
    })
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting generator API v{}", env!("CARGO_PKG_VERSION"));

    let port = config.port;
    let state = build_state(config).await?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn generate(config: Config, request: ContentRequest) -> Result<()> {
    let state = build_state(config).await?;
    let plan = plan(&request)?;
    let summary = summarize(&plan.items);
    eprintln!("{}", render_report(&plan, &summary));

    let bundle = assemble(
        &request,
        plan,
        state.lookup.as_ref(),
        state.generator.as_ref(),
        &state.assembly,
    )
    .await;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
