use std::future::ready;
use std::net::SocketAddr;

use axum::routing::get;
use guardian::config::Configuration;
use guardian::{app, initialize_state, telemetry};
use opentelemetry::global;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // read configuration file. let it in memory.
    let config = Configuration::default().read()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("guardian=info,tower_http=info"));

    // Ship logs to the collector when one is configured.
    let otlp = match &config.telemetry {
        Some(cfg) => {
            if cfg.traces {
                let provider = telemetry::setup_tracer(&cfg.endpoint)?;
                global::set_tracer_provider(provider);
            }
            Some(telemetry::setup_logging(&cfg.endpoint)?.boxed())
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otlp)
        .init();

    let recorder = telemetry::setup_metrics_recorder()?;

    let addr: SocketAddr = format!("{}:{}", config.address, config.port).parse()?;
    let state = initialize_state(config).await?;

    let app = app(state)
        .route("/metrics", get(move || ready(recorder.render())));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
