//! Document shell shared by every page: head, header with nav, footer.

use crate::config::{self, SiteConfig};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS_STATIC: &str = include_str!("../../static/style.css");

/// Top-level navigation sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Journal,
    Trips,
    Countries,
    Map,
    None,
}

const NAV: [(Section, &str, &str); 4] = [
    (Section::Journal, "/", "Journal"),
    (Section::Trips, "/trips", "Trips"),
    (Section::Countries, "/countries", "Countries"),
    (Section::Map, "/map", "Map"),
];

/// Full stylesheet: palette properties from config, then the static rules.
pub fn stylesheet(config: &SiteConfig) -> String {
    format!(
        "{}\n\n{}",
        config::generate_color_css(&config.colors),
        CSS_STATIC
    )
}

/// `"Cusco · traveling planet earth"`, or the site title alone.
pub fn page_title(page: Option<&str>, config: &SiteConfig) -> String {
    match page {
        Some(p) if !p.is_empty() => format!("{} \u{b7} {}", p, config.site.title),
        _ => config.site.title.clone(),
    }
}

/// Renders the base HTML document structure
pub fn base_document(
    title: Option<&str>,
    config: &SiteConfig,
    current: Section,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="description" content=(config.site.description);
                @if config.site.private {
                    meta name="robots" content="noindex, nofollow";
                }
                title { (page_title(title, config)) }
                style { (PreEscaped(stylesheet(config))) }
            }
            body {
                (site_header(config, current))
                main { (content) }
                (site_footer(config))
            }
        }
    }
}

/// Fixed header with wordmark and section nav.
pub fn site_header(config: &SiteConfig, current: Section) -> Markup {
    html! {
        header.site-header {
            a.wordmark href="/" { (config.site.title) }
            nav.site-nav {
                ul {
                    @for (section, href, label) in NAV {
                        li class=[(section == current).then_some("current")] {
                            a href=(href) { (label) }
                        }
                    }
                }
            }
        }
    }
}

pub fn site_footer(config: &SiteConfig) -> Markup {
    html! {
        footer.site-footer {
            span.footer-title { (config.site.title) }
            span.footer-years { (config.site.year_span()) }
        }
    }
}

/// Section heading with an overline label and an optional "see all" link.
pub fn section_header(overline: &str, heading: &str, link: Option<(&str, &str)>) -> Markup {
    html! {
        div.section-header {
            div {
                span.overline { (overline) }
                h2 { (heading) }
            }
            @if let Some((href, label)) = link {
                a.section-link href=(href) { (label) " \u{2192}" }
            }
        }
    }
}
