pub mod auth;
pub mod error;
pub mod handlers;
pub mod market;
pub mod middleware;
pub mod site;
