//! Not-found and backend-failure pages.

use super::layout::{Section, base_document};
use crate::config::SiteConfig;
use maud::{Markup, html};

fn error_page(config: &SiteConfig, code: &str, title: &str, message: &str) -> Markup {
    let content = html! {
        section.error-page {
            p.overline { (code) }
            h1 { (title) }
            p { (message) }
            a.back href="/" { "\u{2190} Back home" }
        }
    };
    base_document(Some(title), config, Section::None, content)
}

pub fn render_not_found(config: &SiteConfig) -> Markup {
    error_page(
        config,
        "404",
        "Not found",
        "There is no page here. It may have moved, or the post was never published.",
    )
}

/// Shown when the journal backend cannot be reached or answers with an error.
pub fn render_backend_error(config: &SiteConfig) -> Markup {
    error_page(
        config,
        "502",
        "Journal unavailable",
        "The journal could not be loaded right now. Please try again in a moment.",
    )
}
