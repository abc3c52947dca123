use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::{SavingsError, SavingsPipeline, SavingsRequest, WaterSavingsParams};
use crate::transform::SavingsReport;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SavingsPipeline>,
}

impl AppState {
    pub fn new(pipeline: SavingsPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/water-savings", get(water_savings))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "water savings service listening");

    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn water_savings(
    State(state): State<AppState>,
    params: Result<Query<WaterSavingsParams>, QueryRejection>,
) -> Result<Json<SavingsReport>, SavingsError> {
    metrics::counter!("water_savings_requests_total").increment(1);

    let Query(params) = params.map_err(|e| SavingsError::InvalidQuery(e.body_text()))?;
    let request = SavingsRequest::try_from(params)?;
    let report = state.pipeline.run(&request).await?;

    Ok(Json(report))
}
