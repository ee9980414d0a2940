use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::chart_parser::ChartPoint;
use crate::fetcher::{SaihFetcher, StationDetail};
use crate::station_list_parser::StationRecord;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: SaihFetcher,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Every station route answers 200; upstream failures show up as empty payloads
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/station/aforo/all", get(get_all_stations))
        .route("/station/aforo/{station_id}", get(get_station_detail))
        .route(
            "/station/aforo/{station_id}/{metric_type}",
            get(get_station_series),
        )
        .with_state(state)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn get_all_stations(State(state): State<AppState>) -> Json<Vec<StationRecord>> {
    debug!("Listing Aforo stations");
    let stations = state.fetcher.list_all_stations().await;
    info!("Returning {} stations", stations.len());
    Json(stations)
}

#[instrument(skip(state), fields(station_id = %station_id))]
async fn get_station_detail(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
) -> Json<StationDetail> {
    debug!("Fetching detail for station {}", station_id);
    let detail = state.fetcher.get_station_detail(&station_id).await;
    info!(
        "Returning {} metrics for station {}",
        detail.entries().len(),
        station_id
    );
    Json(detail)
}

#[instrument(skip(state), fields(station_id = %station_id, metric_type = %metric_type))]
async fn get_station_series(
    State(state): State<AppState>,
    Path((station_id, metric_type)): Path<(String, String)>,
) -> Json<Vec<ChartPoint>> {
    debug!("Fetching {} series for station {}", metric_type, station_id);
    let points = state
        .fetcher
        .get_station_series(&station_id, &metric_type)
        .await;
    info!(
        "Returning {} {} points for station {}",
        points.len(),
        metric_type,
        station_id
    );
    Json(points)
}
