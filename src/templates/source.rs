//! Read-only template trees.
//!
//! Paths are `/`-separated and relative to the tree root. Globs support `*`
//! within the final path segment only, which is all the layout needs.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::TemplateError;

pub trait TemplateSource: Send + Sync {
    /// Sorted paths matching `pattern`.
    fn glob(&self, pattern: &str) -> Result<Vec<String>, TemplateError>;

    fn read(&self, path: &str) -> Result<String, TemplateError>;
}

/// Templates read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateSource for DirSource {
    fn glob(&self, pattern: &str) -> Result<Vec<String>, TemplateError> {
        let (dir, name_pattern) = split_pattern(pattern);
        let full = self.root.join(dir);
        let entries = fs::read_dir(&full).map_err(|source| TemplateError::Io {
            path: full.display().to_string(),
            source,
        })?;

        let mut matches = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if wildcard_match(name_pattern, name) {
                matches.push(join(dir, name));
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn read(&self, path: &str) -> Result<String, TemplateError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|source| TemplateError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Templates held in memory, including the set compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<String>) -> Self {
        self.files.insert(path.to_owned(), contents.into());
        self
    }

    /// The `ui/html` tree shipped with the crate.
    pub fn embedded() -> Self {
        Self::new()
            .with_file("html/base.html", include_str!("../../ui/html/base.html"))
            .with_file(
                "html/partials/nav.html",
                include_str!("../../ui/html/partials/nav.html"),
            )
            .with_file(
                "html/pages/home.html",
                include_str!("../../ui/html/pages/home.html"),
            )
            .with_file(
                "html/pages/view.html",
                include_str!("../../ui/html/pages/view.html"),
            )
            .with_file(
                "html/pages/create.html",
                include_str!("../../ui/html/pages/create.html"),
            )
            .with_file(
                "html/pages/signup.html",
                include_str!("../../ui/html/pages/signup.html"),
            )
            .with_file(
                "html/pages/login.html",
                include_str!("../../ui/html/pages/login.html"),
            )
    }
}

impl TemplateSource for MemorySource {
    fn glob(&self, pattern: &str) -> Result<Vec<String>, TemplateError> {
        let (dir, name_pattern) = split_pattern(pattern);
        Ok(self
            .files
            .keys()
            .filter(|path| {
                let (file_dir, name) = split_pattern(path);
                file_dir == dir && wildcard_match(name_pattern, name)
            })
            .cloned()
            .collect())
    }

    fn read(&self, path: &str) -> Result<String, TemplateError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| TemplateError::Missing(path.to_owned()))
    }
}

/// Basename of a `/`-separated path.
pub fn basename(path: &str) -> &str {
    split_pattern(path).1
}

fn split_pattern(pattern: &str) -> (&str, &str) {
    match pattern.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", pattern),
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((prefix, rest)) => {
            let Some(tail) = name.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            (0..=tail.len())
                .filter(|&i| tail.is_char_boundary(i))
                .any(|i| wildcard_match(rest, &tail[i..]))
        }
    }
}
