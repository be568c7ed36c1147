use crate::application::auth_service::AuthService;
use crate::application::market_service::MarketService;
use crate::presentation::{auth, market};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

// AppState holding the services
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub market_service: Arc<MarketService>,
    pub cookie_secure: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

/// Mounts every JSON endpoint under `/api`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .route("/quote", web::get().to(market::quote))
            .route("/intraday", web::get().to(market::intraday))
            .route("/search", web::get().to(market::search))
            .route("/insight", web::get().to(market::insight))
            .route("/auth/signup", web::post().to(auth::signup))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/logout", web::post().to(auth::logout))
            .route("/auth/me", web::get().to(auth::me))
            .route("/secure/ping", web::get().to(auth::secure_ping)),
    );
}
