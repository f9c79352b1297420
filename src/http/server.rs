//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every route and its middleware chain
//! - Wire up the outer chain and the request timeout
//! - Bind to the listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;
use crate::http::chain::Chain;
use crate::http::handlers;
use crate::lifecycle::{signals, Shutdown};
use crate::models::{SnippetStore, UserStore};
use crate::session::SessionManager;
use crate::templates::TemplateCache;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<TemplateCache>,
    pub snippets: Arc<dyn SnippetStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub metrics: Option<PrometheusHandle>,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let dynamic = Chain::dynamic();
    let protected = Chain::protected();

    let routes = Router::new()
        .route("/", dynamic.then(&state, get(handlers::home)))
        .route(
            "/snippet/view/{id}",
            dynamic.then(&state, get(handlers::snippet_view)),
        )
        .route(
            "/snippet/create",
            protected.then(
                &state,
                get(handlers::snippet_create).post(handlers::snippet_create_post),
            ),
        )
        .route(
            "/user/signup",
            dynamic.then(
                &state,
                get(handlers::user_signup).post(handlers::user_signup_post),
            ),
        )
        .route(
            "/user/login",
            dynamic.then(
                &state,
                get(handlers::user_login).post(handlers::user_login_post),
            ),
        )
        .route(
            "/user/logout",
            protected.then(&state, post(handlers::user_logout_post)),
        )
        .route("/metrics", get(handlers::metrics))
        .nest_service("/static", ServeDir::new(&config.static_files.dir))
        .fallback(handlers::not_found)
        .with_state(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    Chain::standard().wrap(&state, routes)
}

/// HTTP server for the snippet application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the router for `state` under `config`.
    pub fn new(state: AppState, config: &AppConfig) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    /// Serve on `listener` until a termination signal arrives, then trigger
    /// `shutdown` for background tasks and drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signals::wait_for_termination().await;
                shutdown.trigger();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
