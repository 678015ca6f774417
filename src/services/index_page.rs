use crate::utils::escape_html;
use chrono::{DateTime, Utc};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// One entry on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLink {
    /// Relative href, e.g. "./Acme-0.html"
    pub href: String,
    /// Link text, e.g. "Acme (Daily)"
    pub text: String,
}

impl IndexLink {
    pub fn new(file_name: &str, name: &str, period_label: &str) -> Self {
        Self {
            href: format!("./{}", file_name),
            text: format!("{} ({})", name, period_label),
        }
    }
}

/// Render the static page linking every chart
pub fn render_index(links: &[IndexLink], generated_at: DateTime<Utc>) -> String {
    let links_html: String = links
        .iter()
        .map(|link| {
            format!(
                "    <a href=\"{}\">{}</a><br>\n",
                escape_html(&link.href),
                escape_html(&link.text)
            )
        })
        .collect();

    INDEX_TEMPLATE
        .replace("{{LINKS}}", links_html.trim_end())
        .replace(
            "{{GENERATED_AT}}",
            &generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )
}
