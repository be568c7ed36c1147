pub mod response_cache;
pub mod sqlite_user_repository;
pub mod upstream;
pub mod user_repository;
