use crate::application::market_service::{
    DEFAULT_INTERVAL, DEFAULT_SEARCH_QUERY, DEFAULT_SYMBOL,
};
use crate::domain::market::MarketPayload;
use crate::presentation::error::ApiError;
use crate::presentation::handlers::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::instrument;

const CACHE_HEADER: &str = "x-cache";

#[derive(Debug, Deserialize)]
pub struct SymbolParams {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntradayParams {
    pub symbol: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

fn payload_response(payload: MarketPayload) -> HttpResponse {
    match payload {
        MarketPayload::Json {
            status,
            body,
            cached,
        } => HttpResponse::build(provider_status(status))
            .insert_header((CACHE_HEADER, if cached { "HIT" } else { "MISS" }))
            .json(body),
        MarketPayload::Text { status, body } => HttpResponse::build(provider_status(status))
            .insert_header((CACHE_HEADER, "MISS"))
            .content_type("text/plain; charset=utf-8")
            .body(body),
    }
}

fn provider_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[instrument(skip(state))]
pub async fn quote(
    state: web::Data<AppState>,
    params: web::Query<SymbolParams>,
) -> Result<HttpResponse, ApiError> {
    let symbol = params.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL);
    let payload = state.market_service.quote(symbol).await?;
    Ok(payload_response(payload))
}

#[instrument(skip(state))]
pub async fn intraday(
    state: web::Data<AppState>,
    params: web::Query<IntradayParams>,
) -> Result<HttpResponse, ApiError> {
    let symbol = params.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL);
    let interval = params.interval.as_deref().unwrap_or(DEFAULT_INTERVAL);
    let payload = state.market_service.intraday(symbol, interval).await?;
    Ok(payload_response(payload))
}

#[instrument(skip(state))]
pub async fn search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let keywords = params.q.as_deref().unwrap_or(DEFAULT_SEARCH_QUERY);
    let payload = state.market_service.search(keywords).await?;
    Ok(payload_response(payload))
}

#[instrument(skip(state))]
pub async fn insight(
    state: web::Data<AppState>,
    params: web::Query<SymbolParams>,
) -> HttpResponse {
    let symbol = params.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL);
    HttpResponse::Ok().json(state.market_service.insight(symbol).await)
}
