//! The page shell: HTML templates around composed pages.
//!
//! Templates are embedded in the binary and rendered with Handlebars in
//! strict mode, so a template referring to a missing field fails loudly.

use handlebars::Handlebars;
use serde_json::{Value, json};

use quire_diagram::Theme;

use crate::{
    config::{DiagramConfig, SiteConfig},
    error::QuireError,
    page::Page,
    source::PageTree,
};

const LAYOUT: &str = "layout";
const LANDING: &str = "landing";
const DOCS: &str = "docs";
const NOT_FOUND: &str = "not_found";

const TEMPLATES: [(&str, &str); 4] = [
    (LAYOUT, include_str!("templates/layout.hbs")),
    (LANDING, include_str!("templates/landing.hbs")),
    (DOCS, include_str!("templates/docs.hbs")),
    (NOT_FOUND, include_str!("templates/not_found.hbs")),
];

/// Renders full HTML documents.
#[derive(Debug)]
pub struct Shell {
    registry: Handlebars<'static>,
    site: SiteConfig,
    client_script: Option<String>,
    theme: Theme,
}

impl Shell {
    /// Creates a shell for `site`, taking the client script and theme from
    /// `diagram`.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Template`] if an embedded template is invalid.
    pub fn new(site: SiteConfig, diagram: &DiagramConfig) -> Result<Self, QuireError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        for (name, template) in TEMPLATES {
            registry.register_template_string(name, template)?;
        }

        Ok(Self {
            registry,
            site,
            client_script: diagram.client_script().map(str::to_string),
            theme: diagram.theme(),
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// The landing page.
    pub fn render_landing(&self) -> Result<String, QuireError> {
        let content = self.registry.render(
            LANDING,
            &json!({
                "title": self.site.title(),
                "description": self.site.description(),
            }),
        )?;
        self.wrap(self.site.title(), self.site.description(), content, false)
    }

    /// A docs page with its navigation tree.
    ///
    /// The client diagram script is included only when the page has
    /// diagrams left to the browser.
    pub fn render_docs(&self, page: &Page, tree: &PageTree) -> Result<String, QuireError> {
        let content = self.registry.render(
            DOCS,
            &json!({
                "nav_title": self.site.nav_title(),
                "tree": tree,
                "page": {
                    "title": page.title(),
                    "body": page.body_html(),
                    "toc": page.toc(),
                },
            }),
        )?;

        let title = format!("{} | {}", page.title(), self.site.title());
        let description = page.description().or(self.site.description());
        self.wrap(&title, description, content, page.summary().deferred > 0)
    }

    /// The 404 page.
    pub fn render_not_found(&self) -> Result<String, QuireError> {
        let content = self.registry.render(NOT_FOUND, &json!({}))?;
        let title = format!("Not Found | {}", self.site.title());
        self.wrap(&title, None, content, false)
    }

    fn wrap(
        &self,
        title: &str,
        description: Option<&str>,
        content: String,
        needs_client_script: bool,
    ) -> Result<String, QuireError> {
        let client_script = match (&self.client_script, needs_client_script) {
            (Some(script), true) => Value::from(script.as_str()),
            _ => Value::Null,
        };

        let html = self.registry.render(
            LAYOUT,
            &json!({
                "title": title,
                "description": description,
                "icon": self.site.icon(),
                "content": content,
                "client_script": client_script,
                "theme": theme_name(self.theme),
            }),
        )?;
        Ok(html)
    }
}

/// Theme name as understood by the client-side renderer.
fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Default => "default",
        Theme::Neutral => "neutral",
        Theme::Dark => "dark",
        Theme::Forest => "forest",
    }
}
