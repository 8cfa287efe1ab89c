use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use silver_athena::{load_sdk_config, AthenaClient, PollPolicy, S3ResultStore};
use silver_bigquery::BigQueryClient;
use silver_core::Config;
use silver_pipeline::{silver_jobs, Pipeline};
use silver_server::cli::{CliArgs, Command};
use silver_server::{build_router, AppState};

fn load_config() -> Config {
    silver_core::config::load_dotenv();
    Config::from_env()
}

async fn build_pipeline(config: &Config) -> Pipeline {
    let sdk_config = load_sdk_config(&config.athena.region).await;
    let engine = Arc::new(AthenaClient::new(&sdk_config, &config.athena));
    let store = Arc::new(S3ResultStore::new(&sdk_config));
    let loader = Arc::new(BigQueryClient::from_config(&config.bigquery));

    let jobs = silver_jobs(&config.athena.output_location);
    info!(jobs = jobs.len(), "Pipeline ready");

    Pipeline::new(
        engine,
        store,
        loader,
        PollPolicy::from_config(&config.athena),
        jobs,
    )
}

async fn serve(config: &Config, pipeline: Pipeline) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(pipeline));
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn run_once(pipeline: Pipeline) -> anyhow::Result<()> {
    let report = pipeline.run().await?;
    for job in &report.jobs {
        info!(
            destination = %job.destination,
            query_id = %job.query_id,
            rows = job.rows,
            elapsed_ms = job.elapsed_ms,
            "Job complete"
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config();
    config.log_summary();

    let pipeline = build_pipeline(&config).await;

    match args.command() {
        Command::Serve => serve(&config, pipeline).await,
        Command::Run => run_once(pipeline).await,
    }
}
