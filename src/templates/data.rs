//! Per-request render data.

use minijinja::Value;
use serde::Serialize;

use crate::http::forms::{FormView, Validator};
use crate::models::Snippet;

/// Values exposed to every page. Built fresh for each request.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub form: Value,
    pub flash: String,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    pub fn new(current_year: i32) -> Self {
        Self {
            current_year,
            snippet: None,
            snippets: Vec::new(),
            form: Value::from(()),
            flash: String::new(),
            is_authenticated: false,
            csrf_token: String::new(),
        }
    }

    /// Expose a form's values and its validation errors as `form`.
    pub fn with_form<T: Serialize>(mut self, values: &T, validator: &Validator) -> Self {
        self.form = Value::from_serialize(FormView::new(values, validator));
        self
    }

    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.snippet = Some(snippet);
        self
    }

    pub fn with_snippets(mut self, snippets: Vec<Snippet>) -> Self {
        self.snippets = snippets;
        self
    }
}
