//! Media post-processing worker binary.

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hermes_db::{create_pool, DbConfig, PgCompletionTracker};
use hermes_media::FfmpegSynthesizer;
use hermes_queue::{AmqpPublisher, Broker, QueueConfig};
use hermes_worker::metrics::init_metrics;
use hermes_worker::{retry_async, QueueGateway, RetryConfig, TaskDispatcher, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting hermes-worker");

    if let Err(e) = run().await {
        error!("Worker error: {:#}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hermes=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env();
    let queue_config = QueueConfig::from_env();
    let db_config = DbConfig::from_env();
    info!("Worker config: {:?}", config);
    info!("Queue config: {:?}", queue_config);
    info!("Database config: {:?}", db_config);

    if let Some(addr) = config.metrics_addr {
        init_metrics(addr).context("failed to start metrics exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }

    let synthesizer = FfmpegSynthesizer::new();
    synthesizer.check().context("media tools unavailable")?;

    let pool = retry_async(&RetryConfig::new("postgres_connect"), || {
        create_pool(&db_config)
    })
    .await
    .context("failed to connect to Postgres")?;

    let broker = retry_async(&RetryConfig::new("rabbitmq_connect"), || {
        Broker::connect(&queue_config)
    })
    .await
    .context("failed to connect to RabbitMQ")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    let publisher = AmqpPublisher::new(broker.channel().await?, queue_config.exchange.clone())
        .await
        .context("failed to open publisher channel")?;

    let dispatcher = TaskDispatcher::new(
        &config,
        Arc::new(synthesizer),
        Arc::new(PgCompletionTracker::new(pool.clone())),
        Arc::new(publisher),
        shutdown_rx.clone(),
    );

    let gateway = QueueGateway::new(
        broker.channel().await?,
        queue_config,
        Arc::new(dispatcher),
        config.shutdown_timeout,
    );

    let result = gateway.run(shutdown_rx).await;

    broker.close().await;
    pool.close().await;

    result.context("queue gateway failed")
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
