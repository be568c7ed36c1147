pub mod auth_service;
pub mod market_service;
