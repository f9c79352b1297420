//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use snippetbox::config::AppConfig;
use snippetbox::models::{ModelError, Snippet, SnippetStore, UserStore};
use snippetbox::session::{MemoryStore, SessionManager};
use snippetbox::templates::{MemorySource, TemplateCache};
use snippetbox::{build_router, AppState};
use tower_sessions::session::Id;

/// Snippet store that counts calls and can be told to panic.
#[derive(Default)]
pub struct FakeSnippets {
    pub insert_calls: AtomicUsize,
    pub latest_calls: AtomicUsize,
    pub panic_on_latest: bool,
    rows: Mutex<Vec<Snippet>>,
}

impl FakeSnippets {
    pub fn panicking() -> Self {
        Self {
            panic_on_latest: true,
            ..Self::default()
        }
    }

    pub fn inserts(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

impl SnippetStore for FakeSnippets {
    fn insert<'a>(
        &'a self,
        title: &'a str,
        content: &'a str,
        expires_days: i64,
    ) -> BoxFuture<'a, Result<i64, ModelError>> {
        Box::pin(async move {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            let now = Utc::now();
            rows.push(Snippet {
                id,
                title: title.to_owned(),
                content: content.to_owned(),
                created: now,
                expires: now + Duration::days(expires_days),
            });
            Ok(id)
        })
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Snippet, ModelError>> {
        Box::pin(async move {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(ModelError::NoRecord)
        })
    }

    fn latest(&self) -> BoxFuture<'_, Result<Vec<Snippet>, ModelError>> {
        Box::pin(async move {
            self.latest_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_latest {
                panic!("deliberate failure in snippet store");
            }
            let mut rows = self.rows.lock().unwrap().clone();
            rows.reverse();
            rows.truncate(10);
            Ok(rows)
        })
    }
}

/// User store with one known account: id 1, `alice@example.com` / `pa55word!`.
#[derive(Default)]
pub struct FakeUsers {
    pub authenticate_calls: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "pa55word!";

impl FakeUsers {
    pub fn authentications(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }
}

impl UserStore for FakeUsers {
    fn insert<'a>(
        &'a self,
        _name: &'a str,
        email: &'a str,
        _password: &'a str,
    ) -> BoxFuture<'a, Result<(), ModelError>> {
        Box::pin(async move {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if email == ALICE_EMAIL {
                Err(ModelError::DuplicateEmail)
            } else {
                Ok(())
            }
        })
    }

    fn authenticate<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<i64, ModelError>> {
        Box::pin(async move {
            self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
            if email == ALICE_EMAIL && password == ALICE_PASSWORD {
                Ok(1)
            } else {
                Err(ModelError::InvalidCredentials)
            }
        })
    }

    fn exists(&self, id: i64) -> BoxFuture<'_, Result<bool, ModelError>> {
        Box::pin(async move { Ok(id == 1) })
    }
}

pub struct TestApp {
    pub router: Router,
    pub snippets: Arc<FakeSnippets>,
    pub users: Arc<FakeUsers>,
    pub sessions: MemoryStore,
}

pub fn state_with(
    templates: TemplateCache,
    snippets: Arc<dyn SnippetStore>,
    users: Arc<dyn UserStore>,
    sessions: MemoryStore,
) -> AppState {
    let config = AppConfig::default();
    AppState {
        templates: Arc::new(templates),
        snippets,
        users,
        sessions: SessionManager::new(sessions, &config.session),
        metrics: None,
    }
}

pub fn app_with(templates: TemplateCache, snippets: FakeSnippets) -> TestApp {
    let snippets = Arc::new(snippets);
    let users = Arc::new(FakeUsers::default());
    let sessions = MemoryStore::new();
    let state = state_with(templates, snippets.clone(), users.clone(), sessions.clone());
    TestApp {
        router: build_router(state, &AppConfig::default()),
        snippets,
        users,
        sessions,
    }
}

pub fn app() -> TestApp {
    app_with(embedded_templates(), FakeSnippets::default())
}

pub fn embedded_templates() -> TemplateCache {
    TemplateCache::build(&MemorySource::embedded()).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` of the session cookie set on `response`, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

/// Session id carried by a `session=<id>` cookie pair.
pub fn session_id(cookie: &str) -> Id {
    cookie.trim_start_matches("session=").parse().unwrap()
}

/// The anti-forgery token embedded in a rendered form.
pub fn csrf_token(html: &str) -> Option<String> {
    let marker = "name='csrf_token' value='";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('\'')?;
    Some(html[start..start + end].to_owned())
}

/// Serve `router` on an ephemeral port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Log sink shared between a `fmt` subscriber and the test reading it.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install a plain-text subscriber writing here on the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
