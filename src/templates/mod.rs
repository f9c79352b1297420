//! Template rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     source.rs (directory or embedded files)
//!         → cache.rs (one compiled environment per page, built once)
//!
//! Per request:
//!     handler builds data.rs::TemplateData
//!         → render.rs (execute into a buffer, then emit status + body)
//! ```

pub mod cache;
pub mod data;
pub mod functions;
pub mod render;
pub mod source;

pub use cache::TemplateCache;
pub use data::TemplateData;
pub use source::{DirSource, MemorySource, TemplateSource};

/// Path of the shared layout inside a template source.
pub const BASE_LAYOUT: &str = "html/base.html";
/// Glob selecting every shared partial.
pub const PARTIALS_GLOB: &str = "html/partials/*.html";
/// Glob selecting every page.
pub const PAGES_GLOB: &str = "html/pages/*.html";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pattern {0} matched no templates")]
    NoMatch(String),

    #[error("template {0} is not in the source")]
    Missing(String),

    #[error("failed to compile {page}: {source}")]
    Compile {
        page: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("the template {0} does not exist")]
    NotFound(String),

    #[error("failed to render {page}: {source}")]
    Render {
        page: String,
        #[source]
        source: minijinja::Error,
    },
}
