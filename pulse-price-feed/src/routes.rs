use std::sync::Arc;

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use pulse_common::{
    error::AppError,
    models::{Token, TokenCategory},
};

use crate::{config::PriceFeedConfig, feed, storage::TokenStore};

pub struct AppState {
    pub store: Arc<dyn TokenStore>,
    pub config: PriceFeedConfig,
}

pub fn create_router(store: Arc<dyn TokenStore>, config: PriceFeedConfig) -> Router {
    let app_state = Arc::new(AppState { store, config });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tokens/{category}", get(get_tokens))
        .route("/api/tokens/{category}/{id}", get(get_token))
        .route("/ws", get(subscribe_price_feed))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "pulse-price-feed",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_tokens(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Token>>, AppError> {
    let category: TokenCategory = category.parse()?;
    let tokens = state.store.get_all_tokens(category).await?;
    Ok(Json(tokens))
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, String)>,
) -> Result<Json<Token>, AppError> {
    // category is part of the path contract but lookup is by id
    let _: TokenCategory = category.parse()?;

    let token = state
        .store
        .get_token_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Token not found".to_string()))?;

    Ok(Json(token))
}

async fn subscribe_price_feed(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let store = state.store.clone();
    let config = state.config.clone();
    ws.on_upgrade(move |socket| feed::run(socket, store, config))
}
