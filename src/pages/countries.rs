//! Country listing and the continent index ("map").

use super::layout::{Section, base_document, section_header};
use crate::config::SiteConfig;
use crate::display::{format_count, journal_date_range};
use crate::types::CountryWithStats;
use maud::{Markup, html};
use std::collections::BTreeMap;

const ELSEWHERE: &str = "Elsewhere";

fn country_card(country: &CountryWithStats) -> Markup {
    let dates = journal_date_range(
        country.first_post_date.as_ref(),
        country.last_post_date.as_ref(),
    );
    let trips = country.trip_names();
    html! {
        div.country-card {
            div.country-name {
                @if let Some(flag) = country.flag() {
                    span.flag { (flag) }
                }
                h3 { (country.name) }
            }
            p.country-posts {
                span.post-count { (format_count(country.total_posts)) }
                @if country.total_posts == 1 { " post" } @else { " posts" }
            }
            @if !dates.is_empty() {
                p.dates { (dates) }
            }
            @if !trips.is_empty() {
                p.trip-names { (trips.join(" \u{b7} ")) }
            }
        }
    }
}

pub fn render_countries(config: &SiteConfig, countries: &[CountryWithStats]) -> Markup {
    let content = html! {
        section.countries-section {
            (section_header("Visited", "Countries", Some(("/map", "By continent"))))
            @if countries.is_empty() {
                p.empty { "No countries yet." }
            } @else {
                div.country-grid {
                    @for country in countries {
                        (country_card(country))
                    }
                }
            }
        }
    };
    base_document(Some("Countries"), config, Section::Countries, content)
}

/// Countries grouped by continent, continents alphabetically with the
/// unknown group last. Order within a group is preserved.
pub fn group_by_continent(countries: &[CountryWithStats]) -> Vec<(&str, Vec<&CountryWithStats>)> {
    let mut groups: BTreeMap<&str, Vec<&CountryWithStats>> = BTreeMap::new();
    let mut elsewhere = Vec::new();
    for country in countries {
        match country.continent.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(continent) => groups.entry(continent).or_default().push(country),
            None => elsewhere.push(country),
        }
    }
    let mut out: Vec<_> = groups.into_iter().collect();
    if !elsewhere.is_empty() {
        out.push((ELSEWHERE, elsewhere));
    }
    out
}

pub fn render_map(config: &SiteConfig, countries: &[CountryWithStats]) -> Markup {
    let groups = group_by_continent(countries);
    let content = html! {
        section.map-section {
            (section_header("Atlas", "The Map", Some(("/countries", "All countries"))))
            @for (continent, members) in &groups {
                @let total: u64 = members.iter().map(|c| c.total_posts).sum();
                div.continent {
                    h2 {
                        (continent)
                        span.continent-count { " " (members.len()) " \u{b7} " (format_count(total)) " posts" }
                    }
                    ul.continent-countries {
                        @for country in members {
                            li {
                                @if let Some(flag) = country.flag() {
                                    span.flag { (flag) " " }
                                }
                                span.name { (country.name) }
                                span.post-count { (format_count(country.total_posts)) }
                            }
                        }
                    }
                }
            }
        }
    };
    base_document(Some("Map"), config, Section::Map, content)
}
