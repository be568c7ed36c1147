use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use market_gateway::application::auth_service::AuthService;
use market_gateway::application::market_service::{MarketService, MarketSettings};
use market_gateway::data::response_cache::InMemoryResponseCache;
use market_gateway::data::sqlite_user_repository::SqliteUserRepository;
use market_gateway::data::upstream::{AlphaVantageClient, ChatCompletionClient};
use market_gateway::infrastructure::config::Config;
use market_gateway::infrastructure::logging::init_logging;
use market_gateway::presentation::handlers::{AppState, configure_api};
use market_gateway::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use market_gateway::presentation::site::configure_site;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env()?;
    info!(config = ?config, "Configuration loaded");
    if config.alpha_vantage_key.is_none() {
        warn!("ALPHAVANTAGE_KEY not set; market endpoints will answer 500");
    }
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; insight endpoint runs in degraded mode");
    }

    let user_repository = SqliteUserRepository::connect(&config.database_url, 5).await?;
    let auth_service = AuthService::new(
        Arc::new(user_repository),
        config.secret_key.clone(),
        config.session_ttl_secs,
    );

    let market_service = MarketService::new(
        Arc::new(InMemoryResponseCache::new()),
        Arc::new(AlphaVantageClient::new(
            config.alpha_vantage_url.clone(),
            config.upstream_timeout(),
        )?),
        Arc::new(ChatCompletionClient::new(
            config.groq_api_url.clone(),
            config.upstream_timeout(),
        )?),
        MarketSettings {
            market_api_key: config.alpha_vantage_key.clone(),
            insight_api_key: config.groq_api_key.clone(),
            insight_model: config.groq_model.clone(),
            cache_ttl_secs: config.cache_ttl_secs,
        },
    );

    let state = web::Data::new(AppState {
        auth_service: Arc::new(auth_service),
        market_service: Arc::new(market_service),
        cookie_secure: config.cookie_secure,
    });

    let static_dir = PathBuf::from(&config.static_dir);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(configure_api)
            .configure(configure_site(static_dir.clone()))
    });

    let bind_addr = (config.host.as_str(), config.port);
    let server = server.bind(bind_addr)?;
    info!(host = %config.host, port = config.port, "Starting HTTP server");
    server.run().await?;
    Ok(())
}
