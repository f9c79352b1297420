//! Environment settings and custom filters shared by every compiled page.

use chrono::{DateTime, Utc};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};

/// Apply engine settings and register filters.
pub fn configure(env: &mut Environment<'static>) {
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_filter("human_date", human_date);
}

/// Format an RFC 3339 timestamp as `02 Jan 2006 at 15:04` in UTC.
/// An empty value renders as an empty string.
pub fn human_date(value: &str) -> Result<String, Error> {
    if value.is_empty() {
        return Ok(String::new());
    }
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, "human_date expects an RFC 3339 timestamp")
            .with_source(e)
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .format("%d %b %Y at %H:%M")
        .to_string())
}
