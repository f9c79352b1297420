//! Response marking for the load-and-save step.

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

/// Keep shared caches from storing responses that set the session cookie.
///
/// Sits directly outside the session manager layer.
pub async fn vary_on_cookie(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if response.headers().contains_key(header::SET_COOKIE) {
        let headers = response.headers_mut();
        headers.append(header::VARY, HeaderValue::from_static("Cookie"));
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(r#"no-cache="Set-Cookie""#),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::config::SessionConfig;
    use crate::session::{MemoryStore, Session, SessionManager};

    fn app(store: MemoryStore) -> Router {
        let manager = SessionManager::new(store, &SessionConfig::default());
        Router::new()
            .route(
                "/put",
                get(|session: Session| async move {
                    session.put_string("flash", "hello").await.unwrap();
                    StatusCode::OK
                }),
            )
            .route(
                "/pop",
                get(|session: Session| async move { session.pop_string("flash").await.unwrap() }),
            )
            .route(
                "/visit",
                get(|session: Session| async move {
                    let seen = session.get_bool("seen").await.unwrap();
                    session.put_bool("seen", true).await.unwrap();
                    if seen { "again" } else { "first" }
                }),
            )
            .route("/noop", get(|| async { "noop" }))
            .layer(manager.layer())
            .layer(axum::middleware::from_fn(vary_on_cookie))
    }

    #[tokio::test]
    async fn untouched_session_sets_no_cookie() {
        let response = app(MemoryStore::new())
            .oneshot(Request::get("/noop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(response.headers().get(header::VARY).is_none());
    }

    #[tokio::test]
    async fn value_written_in_one_request_is_read_in_the_next() {
        let store = MemoryStore::new();
        let app = app(store.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/put").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert_eq!(response.headers()[header::VARY], "Cookie");
        assert_eq!(store.len(), 1);

        let pair = cookie.split(';').next().unwrap().to_owned();
        let response = app
            .oneshot(
                Request::get("/pop")
                    .header(header::COOKIE, pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn flags_default_to_false_and_persist() {
        let app = app(MemoryStore::new());
        let response = app
            .clone()
            .oneshot(Request::get("/visit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"first");

        let pair = cookie.split(';').next().unwrap().to_owned();
        let response = app
            .oneshot(
                Request::get("/visit")
                    .header(header::COOKIE, pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"again");
    }
}
