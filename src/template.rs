//! Page shell rendering around the generated bubble markup.

use minijinja::Environment;
use serde::Serialize;

use crate::bubble::{self, MessageUnit};
use crate::settings::BubbleSettings;

const PAGE_TEMPLATE: &str = include_str!("templates/page.html.jinja");

/// Context data passed to the page template
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub title: String,
    /// CSS custom properties set on the document root
    pub css_variables: Vec<CssVar>,
    pub opacity_label: String,
    /// Pre-rendered message containers, inserted unescaped
    pub messages_html: String,
    pub unit_count: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct CssVar {
    pub name: &'static str,
    pub value: String,
}

impl PageContext {
    pub fn new(title: impl Into<String>, settings: &BubbleSettings, units: &[MessageUnit]) -> Self {
        Self {
            title: title.into(),
            css_variables: settings
                .css_variables()
                .into_iter()
                .map(|(name, value)| CssVar { name, value })
                .collect(),
            opacity_label: settings.opacity_label(),
            messages_html: bubble::units_to_html(units),
            unit_count: units.len(),
        }
    }
}

/// Render a complete standalone HTML page.
pub fn render_page(ctx: &PageContext) -> anyhow::Result<String> {
    let mut env = Environment::new();
    // the .html suffix turns on auto-escaping
    env.add_template("page.html", PAGE_TEMPLATE)?;

    let template = env.get_template("page.html")?;
    let rendered = template.render(ctx)?;

    Ok(rendered)
}
