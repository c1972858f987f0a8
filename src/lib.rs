pub mod advisor;
pub mod config;
pub mod error;
pub mod inference;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod router;
