//! HTTP front end for the report pipeline.

pub mod api;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod sink;

use errors::CollectorError;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

pub async fn run(config: config::Config) -> Result<(), CollectorError> {
    let sink = sink::build_sink(&config.sink);
    tracing::info!(sink = sink.name(), "sink configured");

    let state = api::AppState::new(sink, config.summary_days);
    let app = api::router(state, config.max_body_bytes);

    let ready = Arc::new(AtomicBool::new(false));
    let is_ready = {
        let ready = ready.clone();
        move || ready.load(Ordering::Relaxed)
    };

    let listener =
        TcpListener::bind(format!("{}:{}", config.listener.host, config.listener.port)).await?;
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        "collector listening"
    );
    ready.store(true, Ordering::Relaxed);

    let api_task = async { axum::serve(listener, app).await.map_err(CollectorError::from) };
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, CollectorError>::new(is_ready),
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
