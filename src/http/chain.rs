//! Middleware chain composition.
//!
//! A chain is an ordered list of [`Step`]s, outermost first. Composition folds
//! the list right-to-left, so `steps()[0]` sees a request before anything else
//! in the chain. Three chains exist:
//!
//! - `standard`: recovery → request logging → security headers, wrapped
//!   around the whole router
//! - `dynamic`: session → CSRF → auth flag → route metrics, per public route
//! - `protected`: `dynamic` with the authentication gate ahead of route metrics
//!
//! Per-route chains are applied as route layers, so a method the route does
//! not serve gets its 405 without touching the session.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::MethodRouter;
use axum::Router;

use crate::http::server::AppState;
use crate::observability::{metrics, request_log::log_request};
use crate::security::{
    authenticate, csrf_protect, recover_panic, require_authentication, secure_headers,
};
use crate::session::vary_on_cookie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Recovery,
    RequestLogging,
    SecurityHeaders,
    SessionLoadAndSave,
    CsrfProtection,
    AuthStatePropagation,
    RequireAuthentication,
    RouteMetrics,
}

/// Apply one step with `$apply` (`layer` or `route_layer`). `Router` and
/// `MethodRouter` share the shape of both but no trait, hence the macro.
macro_rules! layer_step {
    ($target:expr, $apply:ident, $step:expr, $state:expr) => {
        match $step {
            Step::Recovery => $target.$apply(from_fn(recover_panic)),
            Step::RequestLogging => $target.$apply(from_fn(log_request)),
            Step::SecurityHeaders => $target.$apply(from_fn(secure_headers)),
            Step::SessionLoadAndSave => $target
                .$apply($state.sessions.layer())
                .$apply(from_fn(vary_on_cookie)),
            Step::CsrfProtection => $target.$apply(from_fn(csrf_protect)),
            Step::AuthStatePropagation => {
                $target.$apply(from_fn_with_state($state.clone(), authenticate))
            }
            Step::RequireAuthentication => $target.$apply(from_fn(require_authentication)),
            Step::RouteMetrics => $target.$apply(from_fn(metrics::track)),
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    /// A chain of `steps`, outermost first.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Steps every request passes through, wrapped around the router.
    pub fn standard() -> Self {
        Self::new([Step::Recovery, Step::RequestLogging, Step::SecurityHeaders])
    }

    /// Steps for public pages.
    pub fn dynamic() -> Self {
        Self::new([
            Step::SessionLoadAndSave,
            Step::CsrfProtection,
            Step::AuthStatePropagation,
            Step::RouteMetrics,
        ])
    }

    /// Steps for pages that need a logged-in user.
    pub fn protected() -> Self {
        Self::dynamic().insert_before(Step::RouteMetrics, Step::RequireAuthentication)
    }

    /// A new chain with `step` placed directly outside `anchor`, or innermost
    /// when `anchor` is absent.
    pub fn insert_before(&self, anchor: Step, step: Step) -> Self {
        let mut steps = self.steps.clone();
        let at = steps.iter().position(|s| *s == anchor).unwrap_or(steps.len());
        steps.insert(at, step);
        Self { steps }
    }

    /// Outermost first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Wrap one route's handlers with every step.
    pub fn then(&self, state: &AppState, handler: MethodRouter<AppState>) -> MethodRouter<AppState> {
        self.steps
            .iter()
            .rev()
            .fold(handler, |inner, step| layer_step!(inner, route_layer, step, state))
    }

    /// Wrap a whole router, fallback included, with every step.
    pub fn wrap<S>(&self, state: &AppState, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.steps
            .iter()
            .rev()
            .fold(router, |inner, step| layer_step!(inner, layer, step, state))
    }
}
