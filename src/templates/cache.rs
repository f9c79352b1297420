//! Startup-time template cache.
//!
//! Every page compiles into its own environment holding the base layout, the
//! whole partial set and that one page. The page extends the layout, so the
//! page is the render entry point and the layout supplies the outer document.
//! The cache is immutable once built; handlers share it behind an `Arc`.

use std::collections::HashMap;

use minijinja::Environment;

use super::source::{basename, TemplateSource};
use super::{functions, TemplateError, BASE_LAYOUT, PAGES_GLOB, PARTIALS_GLOB};

pub(crate) struct CompiledPage {
    pub(crate) env: Environment<'static>,
    pub(crate) entry: String,
}

pub struct TemplateCache {
    pages: HashMap<String, CompiledPage>,
}

impl TemplateCache {
    /// Compile every page in `source`. Any failure aborts the whole build.
    pub fn build(source: &dyn TemplateSource) -> Result<Self, TemplateError> {
        let base = source.read(BASE_LAYOUT)?;

        let partials = source
            .glob(PARTIALS_GLOB)?
            .into_iter()
            .map(|path| source.read(&path).map(|body| (path, body)))
            .collect::<Result<Vec<_>, _>>()?;
        if partials.is_empty() {
            return Err(TemplateError::NoMatch(PARTIALS_GLOB.to_owned()));
        }

        let page_paths = source.glob(PAGES_GLOB)?;
        if page_paths.is_empty() {
            return Err(TemplateError::NoMatch(PAGES_GLOB.to_owned()));
        }

        let mut pages = HashMap::with_capacity(page_paths.len());
        for path in page_paths {
            let name = basename(&path).to_owned();
            let compile_err = |source| TemplateError::Compile {
                page: name.clone(),
                source,
            };

            let mut env = Environment::new();
            functions::configure(&mut env);
            env.add_template_owned(BASE_LAYOUT.to_owned(), base.clone())
                .map_err(compile_err)?;
            for (partial, body) in &partials {
                env.add_template_owned(partial.clone(), body.clone())
                    .map_err(compile_err)?;
            }
            env.add_template_owned(path.clone(), source.read(&path)?)
                .map_err(compile_err)?;

            pages.insert(name, CompiledPage { env, entry: path });
        }

        tracing::info!(pages = pages.len(), "template cache built");
        Ok(Self { pages })
    }

    /// Page names in the cache, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    pub(crate) fn page(&self, page: &str) -> Option<&CompiledPage> {
        self.pages.get(page)
    }
}
