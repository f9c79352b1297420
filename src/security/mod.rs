//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → recovery.rs (outermost; contains panics)
//!     → headers.rs (security response headers)
//!     → [router; session layer]
//!     → csrf.rs (issue or validate the anti-forgery token)
//!     → auth.rs (propagate the auth flag; gate protected routes)
//! ```

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod recovery;

pub use auth::{authenticate, require_authentication};
pub use csrf::{csrf_protect, CsrfToken};
pub use headers::secure_headers;
pub use recovery::recover_panic;
