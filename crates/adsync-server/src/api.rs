use std::sync::Arc;

use adsync_market::BumpOptions;
use adsync_shared::payload::{CreateAdPayload, UpdateAdPayload};
use adsync_shared::{ActionState, AdRecord};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::sync::{AdSyncCoordinator, ReconciledAd};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<AdSyncCoordinator>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/blocket-ads", get(list_ads).post(create_ad))
        .route(
            "/api/blocket-ads/{id}",
            get(get_ad).patch(update_ad).delete(delete_ad),
        )
        .route("/api/blocket-ads/{id}/bump", post(bump_ad))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    marketplace: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        marketplace: state.config.marketplace_enabled(),
    })
}

// Unparseable ids can never name a record.
fn parse_id(raw: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::NotFound)
}

async fn list_ads(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AdRecord>>, ServerError> {
    Ok(Json(state.coordinator.list(user.id())?))
}

async fn create_ad(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateAdPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AdRecord>), ServerError> {
    let Json(payload) = payload?;
    let record = state.coordinator.create(user.id(), payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReconciledAd>, ServerError> {
    let id = parse_id(&id)?;
    Ok(Json(state.coordinator.reconcile(user.id(), id).await?))
}

async fn update_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAdPayload>, JsonRejection>,
) -> Result<Json<AdRecord>, ServerError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    Ok(Json(state.coordinator.update(user.id(), id, payload).await?))
}

async fn delete_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let id = parse_id(&id)?;
    state.coordinator.delete(user.id(), id).await?;
    Ok(Json(MessageResponse {
        message: "Ad deleted successfully".to_string(),
    }))
}

/// The body is optional; an empty one means "all channels".
async fn bump_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), ServerError> {
    let id = parse_id(&id)?;
    let options = if body.iter().all(u8::is_ascii_whitespace) {
        BumpOptions::default()
    } else {
        serde_json::from_slice::<BumpOptions>(&body)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?
    };

    let record = state.coordinator.bump(user.id(), id, options).await?;
    let message = match (record.action_state, record.error_message) {
        (Some(ActionState::Error), Some(e)) => format!("Ad renewal failed: {e}"),
        _ => "Ad renewal initiated".to_string(),
    };

    Ok((StatusCode::ACCEPTED, Json(MessageResponse { message })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
