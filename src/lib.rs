//! Snippetbox: a server-rendered snippet sharing application.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod security;
pub mod session;
pub mod templates;

pub use config::AppConfig;
pub use http::{build_router, AppState, HttpServer};
pub use lifecycle::Shutdown;
