//! Route handlers.
//!
//! Handlers return `Result<Response, AppError>`; expected domain outcomes
//! (missing snippet, duplicate email, bad credentials) are translated here and
//! never reach the server-error path.

use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{Datelike, Utc};

use crate::http::context::is_authenticated;
use crate::http::errors::AppError;
use crate::http::forms::{LoginForm, SignupForm, SnippetCreateForm, Validator};
use crate::http::server::AppState;
use crate::models::ModelError;
use crate::security::CsrfToken;
use crate::session::{keys, Session};
use crate::templates::TemplateData;

/// Request state every rendered page needs.
pub struct Page {
    session: Session,
    authenticated: bool,
    csrf_token: String,
}

impl Page {
    /// Fresh render data; consumes the one-shot flash message.
    pub async fn template_data(&self) -> Result<TemplateData, AppError> {
        let mut data = TemplateData::new(Utc::now().year());
        data.flash = self.session.pop_string(keys::FLASH).await?;
        data.is_authenticated = self.authenticated;
        data.csrf_token = self.csrf_token.clone();
        Ok(data)
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_extensions(&parts.extensions)?;
        let csrf_token = parts
            .extensions
            .get::<CsrfToken>()
            .map(|t| t.0.clone())
            .unwrap_or_default();
        Ok(Self {
            session,
            authenticated: is_authenticated(&parts.extensions),
            csrf_token,
        })
    }
}

fn form_payload<T>(form: Result<Form<T>, FormRejection>) -> Result<T, AppError> {
    form.map(|Form(f)| f).map_err(|rejection| {
        tracing::debug!(error = %rejection, "unparseable form");
        AppError::Client(StatusCode::BAD_REQUEST)
    })
}

pub async fn home(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;
    let data = page.template_data().await?.with_snippets(snippets);
    Ok(state.templates.render(StatusCode::OK, "home.html", &data)?)
}

pub async fn snippet_view(
    State(state): State<AppState>,
    page: Page,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = id
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or(AppError::NotFound)?;

    let snippet = match state.snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(ModelError::NoRecord) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let data = page.template_data().await?.with_snippet(snippet);
    Ok(state.templates.render(StatusCode::OK, "view.html", &data)?)
}

pub async fn snippet_create(
    State(state): State<AppState>,
    page: Page,
) -> Result<Response, AppError> {
    let form = SnippetCreateForm {
        expires: 365,
        ..Default::default()
    };
    let data = page.template_data().await?.with_form(&form, &Validator::default());
    Ok(state.templates.render(StatusCode::OK, "create.html", &data)?)
}

pub async fn snippet_create_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<SnippetCreateForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = form_payload(form)?;
    let validator = form.validate();
    if !validator.valid() {
        let data = page.template_data().await?.with_form(&form, &validator);
        return Ok(state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create.html", &data)?);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!(snippet_id = id, "snippet created");

    page.session
        .put_string(keys::FLASH, "Snippet successfully created!")
        .await?;
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

pub async fn user_signup(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    let data = page
        .template_data()
        .await?
        .with_form(&SignupForm::default(), &Validator::default());
    Ok(state.templates.render(StatusCode::OK, "signup.html", &data)?)
}

pub async fn user_signup_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = form_payload(form)?;
    let mut validator = form.validate();

    if validator.valid() {
        match state.users.insert(&form.name, &form.email, &form.password).await {
            Ok(()) => {
                page.session
                    .put_string(keys::FLASH, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                validator.add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?.with_form(&form, &validator);
    Ok(state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "signup.html", &data)?)
}

pub async fn user_login(State(state): State<AppState>, page: Page) -> Result<Response, AppError> {
    let data = page
        .template_data()
        .await?
        .with_form(&LoginForm::default(), &Validator::default());
    Ok(state.templates.render(StatusCode::OK, "login.html", &data)?)
}

pub async fn user_login_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let form = form_payload(form)?;
    let mut validator = form.validate();

    if validator.valid() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(id) => {
                let session = &page.session;
                session.renew_token().await?;
                session.put_int(keys::AUTHENTICATED_USER_ID, id).await?;
                let target = session.pop_string(keys::REDIRECT_AFTER_LOGIN).await?;
                let target = if target.is_empty() {
                    "/snippet/create".to_owned()
                } else {
                    target
                };
                tracing::info!(user_id = id, "user logged in");
                return Ok(Redirect::to(&target).into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                validator.add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?.with_form(&form, &validator);
    Ok(state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "login.html", &data)?)
}

pub async fn user_logout_post(session: Session) -> Result<Response, AppError> {
    session.renew_token().await?;
    session.remove(keys::AUTHENTICATED_USER_ID).await?;
    session
        .put_string(keys::FLASH, "You've been logged out successfully!")
        .await?;
    Ok(Redirect::to("/").into_response())
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => AppError::NotFound.into_response(),
    }
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
