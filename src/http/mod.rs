//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, outer chain, timeout)
//!     → chain.rs (per-route dynamic or protected chain)
//!     → handlers.rs (forms.rs for input, context.rs for the auth flag)
//!     → templates::render or errors.rs
//!     → Send to client
//! ```

pub mod chain;
pub mod context;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod server;

pub use chain::{Chain, Step};
pub use errors::AppError;
pub use server::{build_router, AppState, HttpServer};
