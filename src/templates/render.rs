//! Buffered rendering.
//!
//! Output is produced into a private buffer first; the status line and body
//! are only assembled once execution has succeeded, so a failing template
//! never leaks partial markup.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::{TemplateCache, TemplateData, TemplateError};

impl TemplateCache {
    /// Execute `page` with `data` and return the bytes.
    pub fn render_bytes(&self, page: &str, data: &TemplateData) -> Result<Vec<u8>, TemplateError> {
        let compiled = self
            .page(page)
            .ok_or_else(|| TemplateError::NotFound(page.to_owned()))?;
        let render_err = |source| TemplateError::Render {
            page: page.to_owned(),
            source,
        };

        let template = compiled.env.get_template(&compiled.entry).map_err(render_err)?;
        let mut buf = Vec::new();
        template.render_to_write(data, &mut buf).map_err(render_err)?;
        Ok(buf)
    }

    /// Render `page` as an HTML response with `status`.
    pub fn render(
        &self,
        status: StatusCode,
        page: &str,
        data: &TemplateData,
    ) -> Result<Response, TemplateError> {
        let body = self.render_bytes(page, data)?;
        Ok((
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{MemorySource, BASE_LAYOUT};

    fn cache() -> TemplateCache {
        let source = MemorySource::new()
            .with_file(
                BASE_LAYOUT,
                "<title>{% block title %}{% endblock %}</title>{% include \"html/partials/nav.html\" %}<main>{% block main %}{% endblock %}</main>",
            )
            .with_file("html/partials/nav.html", "<nav>{{ is_authenticated }}</nav>")
            .with_file(
                "html/pages/home.html",
                r#"{% extends "html/base.html" %}{% block title %}Home{% endblock %}{% block main %}{{ current_year }}{% endblock %}"#,
            )
            .with_file(
                "html/pages/broken.html",
                r#"{% extends "html/base.html" %}{% block main %}PARTIAL-OUTPUT {{ nothing_here.title }}{% endblock %}"#,
            );
        TemplateCache::build(&source).unwrap()
    }

    #[test]
    fn renders_layout_with_page_blocks() {
        let html = cache().render_bytes("home.html", &TemplateData::new(2024)).unwrap();
        assert_eq!(
            String::from_utf8(html).unwrap(),
            "<title>Home</title><nav>false</nav><main>2024</main>"
        );
    }

    #[test]
    fn unknown_page_is_not_found() {
        let err = cache().render_bytes("nope.html", &TemplateData::new(2024)).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(p) if p == "nope.html"));
    }

    #[test]
    fn execution_failure_returns_error_not_partial_output() {
        let result = cache().render(StatusCode::OK, "broken.html", &TemplateData::new(2024));
        assert!(matches!(result, Err(TemplateError::Render { .. })));
    }

    #[tokio::test]
    async fn response_carries_status_and_html_type() {
        let response = cache()
            .render(StatusCode::CREATED, "home.html", &TemplateData::new(2024))
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
