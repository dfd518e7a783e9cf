//! Trip listing and trip detail pages.

use super::components::{markdown, post_grid, trip_list};
use super::layout::{Section, base_document, section_header};
use crate::config::SiteConfig;
use crate::types::{TimelineRow, TripWithCountries};
use maud::{Markup, html};

pub fn render_trips(config: &SiteConfig, trips: &[TripWithCountries]) -> Markup {
    let content = html! {
        section.trips-section {
            (section_header("Adventures", "All Trips", None))
            @if trips.is_empty() {
                p.empty { "No trips yet." }
            } @else {
                (trip_list(trips, config.pages.trip_row_countries))
            }
        }
    };
    base_document(Some("Trips"), config, Section::Trips, content)
}

pub fn render_trip(config: &SiteConfig, trip: &TripWithCountries, posts: &[TimelineRow]) -> Markup {
    let dates = trip.date_range();
    let content = html! {
        article.trip-page {
            header.trip-header {
                a.back href="/trips" { "\u{2190} All trips" }
                h1 { (trip.trip_name) }
                ul.trip-flags {
                    @for (flag, name) in trip.flagged_countries() {
                        li {
                            @if let Some(flag) = flag {
                                span.flag { (flag) " " }
                            }
                            (name)
                        }
                    }
                }
                p.trip-meta {
                    @if !dates.is_empty() {
                        span.dates { (dates) }
                        " \u{b7} "
                    }
                    span.post-count { (trip.post_count) " posts" }
                    @if let Some(km) = trip.total_distance_km.filter(|km| *km > 0.0) {
                        " \u{b7} "
                        span.distance { (crate::display::format_count(km.round() as u64)) " km" }
                    }
                }
                @if let Some(description) = trip.description.as_deref().filter(|d| !d.trim().is_empty()) {
                    div.trip-description { (markdown(description)) }
                }
            }
            @if posts.is_empty() {
                p.empty { "No posts from this trip yet." }
            } @else {
                (post_grid(posts))
            }
        }
    };
    base_document(Some(&trip.trip_name), config, Section::Trips, content)
}
