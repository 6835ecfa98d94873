use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::adapter::BluetoothAdapter;
use crate::peripheral::{AdvertisementData, DiscoveredPeripheral};
use crate::session::{ScanRequest, ScanSession};

pub struct AppState<A> {
    pub session: Arc<RwLock<ScanSession<A>>>,
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

/// One row of the ranked device list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeripheralSummary {
    pub id: String,
    pub name: String,
    pub rssi: i16,
    pub strength: String,
    pub color: String,
}

impl From<&DiscoveredPeripheral> for PeripheralSummary {
    fn from(p: &DiscoveredPeripheral) -> Self {
        let strength = p.strength();
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            rssi: p.rssi,
            strength: strength.label().to_string(),
            color: strength.color().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeripheralDetail {
    #[serde(flatten)]
    pub summary: PeripheralSummary,
    pub services: Vec<Uuid>,
    pub services_label: String,
    pub local_name: Option<String>,
    pub manufacturer_data: Option<String>,
    pub tx_power_level: Option<i64>,
    pub advertisement_data: AdvertisementData,
}

impl From<&DiscoveredPeripheral> for PeripheralDetail {
    fn from(p: &DiscoveredPeripheral) -> Self {
        Self {
            summary: p.into(),
            services: p.services().to_vec(),
            services_label: p.services_label(),
            local_name: p.local_name().map(str::to_string),
            manufacturer_data: p.manufacturer_hex(),
            tx_power_level: p.tx_power_level(),
            advertisement_data: p.advertisement_data.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

pub fn router<A>(session: Arc<RwLock<ScanSession<A>>>) -> Router
where
    A: BluetoothAdapter + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/status", get(get_status::<A>))
        .route("/api/peripherals", get(list_peripherals::<A>))
        .route("/api/peripherals/:id", get(get_peripheral::<A>))
        .route("/api/scan/start", post(start_scan::<A>))
        .route("/api/scan/stop", post(stop_scan::<A>))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { session })
}

async fn root() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn get_status<A: BluetoothAdapter>(State(state): State<AppState<A>>) -> Response {
    Json(state.session.read().await.status()).into_response()
}

async fn list_peripherals<A: BluetoothAdapter>(
    State(state): State<AppState<A>>,
    Query(params): Query<ListQuery>,
) -> Response {
    let session = state.session.read().await;
    let peripherals = match params.q.as_deref() {
        Some(q) => session.registry().search(q),
        None => session.snapshot(),
    };

    let rows: Vec<PeripheralSummary> = peripherals.iter().map(PeripheralSummary::from).collect();
    Json(rows).into_response()
}

async fn get_peripheral<A: BluetoothAdapter>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
) -> Response {
    match state.session.read().await.peripheral(&id) {
        Some(p) => Json(PeripheralDetail::from(p)).into_response(),
        None => (StatusCode::NOT_FOUND, "No such device").into_response(),
    }
}

async fn start_scan<A: BluetoothAdapter>(State(state): State<AppState<A>>) -> Response {
    let mut session = state.session.write().await;
    match session.start_scan().await {
        Ok(ScanRequest::Rejected(_)) => {
            (StatusCode::CONFLICT, Json(session.status())).into_response()
        }
        Ok(_) => Json(session.status()).into_response(),
        Err(e) => {
            error!("Failed to start scanning: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to start scanning").into_response()
        }
    }
}

async fn stop_scan<A: BluetoothAdapter>(State(state): State<AppState<A>>) -> Response {
    let mut session = state.session.write().await;
    match session.stop_scan().await {
        Ok(()) => Json(session.status()).into_response(),
        Err(e) => {
            error!("Failed to stop scanning: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to stop scanning").into_response()
        }
    }
}
