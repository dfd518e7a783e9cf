//! Homepage: hero with stats, the trip list, recent posts.

use super::components::{post_grid, stat_item, trip_list};
use super::layout::{Section, base_document, section_header};
use crate::config::SiteConfig;
use crate::types::{Stats, TimelineRow, TripWithCountries};
use maud::{Markup, html};

/// Split the site title into hero lines: each word capitalised, the middle
/// one accented, a full stop at the end.
///
/// `"traveling planet earth"` → `["Traveling", "*Planet*", "Earth."]`
fn hero_lines(title: &str) -> Vec<(String, bool)> {
    let words: Vec<&str> = title.split_whitespace().collect();
    let accent = (words.len() >= 3).then(|| words.len() / 2);
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let mut chars = w.chars();
            let mut word: String = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            if i == last && !word.ends_with('.') {
                word.push('.');
            }
            (word, accent == Some(i))
        })
        .collect()
}

fn hero(config: &SiteConfig, stats: &Stats) -> Markup {
    let site = &config.site;
    html! {
        section.hero {
            span.hero-backdrop aria-hidden="true" { (stats.countries) }
            p.overline {
                (site.tagline) " \u{b7} " (site.first_year) "\u{2013}" (site.last_year)
            }
            h1.hero-title {
                @for (i, (word, accent)) in hero_lines(&site.title).into_iter().enumerate() {
                    @if i > 0 { br; }
                    @if accent {
                        em.accent { (word) }
                    } @else {
                        (word)
                    }
                }
            }
            div.stats {
                (stat_item(stats.posts, "Posts"))
                (stat_item(stats.countries, "Countries"))
                (stat_item(stats.trips, "Trips"))
                (stat_item(u64::from(config.years()), "Years"))
            }
        }
    }
}

pub fn render_home(
    config: &SiteConfig,
    stats: &Stats,
    trips: &[TripWithCountries],
    recent: &[TimelineRow],
) -> Markup {
    let content = html! {
        (hero(config, stats))
        section.trips-section {
            (section_header("Adventures", "The Trips", Some(("/trips", "All trips"))))
            (trip_list(trips, config.pages.trip_row_countries))
        }
        section.recent-section {
            (section_header("Latest", "Recent Posts", Some(("/journal", "Full journal"))))
            (post_grid(recent))
        }
    };
    base_document(None, config, Section::Journal, content)
}
