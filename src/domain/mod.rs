pub mod error;
pub mod market;
pub mod provider;
pub mod repository;
pub mod user;
