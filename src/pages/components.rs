//! Pieces reused across pages: post cards, trip rows, stats, markdown.

use crate::display::{country_summary, format_count, format_post_date, row_number};
use crate::types::{TimelineRow, TripWithCountries};
use maud::{Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

/// Render trusted markdown (trip and country descriptions) to HTML.
pub fn markdown(text: &str) -> Markup {
    let parser = Parser::new(text);
    let mut body = String::new();
    md_html::push_html(&mut body, parser);
    PreEscaped(body)
}

pub fn stat_item(value: u64, label: &str) -> Markup {
    html! {
        div.stat {
            span.stat-value { (format_count(value)) }
            span.stat-label { (label) }
        }
    }
}

/// Card linking to one post: flag, trip tag, summary, place, date, photo count.
pub fn post_card(post: &TimelineRow) -> Markup {
    html! {
        a.post-card href={ "/post/" (post.post_id) } {
            div.post-card-meta {
                @if let Some(flag) = post.flag() {
                    span.flag title=(post.country.as_deref().unwrap_or("")) { (flag) }
                }
                @if let Some(trip) = &post.trip_name {
                    span.tag { (trip) }
                }
            }
            p.post-card-summary {
                (post.summary.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or("\u{2014}"))
            }
            div.post-card-footer {
                div {
                    @if let Some(place) = post.place() {
                        p.place { (place) }
                    }
                    time datetime=(post.post_date.to_string()) { (format_post_date(&post.post_date)) }
                }
                @if post.media_count > 0 {
                    span.photo-count title="Photos" { "\u{25a3} " (post.media_count) }
                }
            }
        }
    }
}

pub fn post_grid(posts: &[TimelineRow]) -> Markup {
    html! {
        div.post-grid {
            @for post in posts {
                (post_card(post))
            }
        }
    }
}

/// Numbered trip row: name, country summary, date range, post count.
pub fn trip_row(index: usize, trip: &TripWithCountries, max_countries: usize) -> Markup {
    let dates = trip.date_range();
    html! {
        a.trip-row href={ "/trips/" (trip.trip_id) } {
            div.trip-row-main {
                span.row-number { (row_number(index)) }
                div {
                    h3 { (trip.trip_name) }
                    p.trip-countries { (country_summary(trip.country_names(), max_countries)) }
                }
            }
            div.trip-row-meta {
                @if !dates.is_empty() {
                    span.dates { (dates) }
                }
                span.post-count { (trip.post_count) span.unit { " posts" } }
                span.arrow { "\u{2192}" }
            }
        }
    }
}

pub fn trip_list(trips: &[TripWithCountries], max_countries: usize) -> Markup {
    html! {
        div.trip-list {
            @for (i, trip) in trips.iter().enumerate() {
                (trip_row(i, trip, max_countries))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> TimelineRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn post_card_full() {
        let card = post_card(&row(json!({
            "post_id": "184512",
            "post_date": "2019-05-03T12:00:00+00:00",
            "summary": "Alpacas.",
            "city": "Cusco",
            "country": "Peru",
            "country_code": "PE",
            "trip_name": "South America",
            "media_count": 4
        })))
        .into_string();
        assert!(card.contains(r#"href="/post/184512""#));
        assert!(card.contains("\u{1F1F5}\u{1F1EA}"));
        assert!(card.contains("South America"));
        assert!(card.contains("Cusco \u{b7} Peru"));
        assert!(card.contains("3 May 2019"));
        assert!(card.contains(r#"datetime="2019-05-03T12:00:00""#));
        assert!(card.contains("photo-count"));
    }

    #[test]
    fn post_card_minimal() {
        let card = post_card(&row(json!({
            "post_id": "1",
            "post_date": "2019-05-03",
            "summary": "   "
        })))
        .into_string();
        assert!(card.contains("\u{2014}"));
        assert!(!card.contains("photo-count"));
        assert!(!card.contains("class=\"flag\""));
        assert!(!card.contains("class=\"tag\""));
    }

    #[test]
    fn trip_row_truncates_countries() {
        let trip: TripWithCountries = serde_json::from_value(json!({
            "trip_id": 12,
            "trip_name": "Europe",
            "start_date": "2022-05-01",
            "countries": ["a", "b", "c", "d", "e", "f", "g"],
            "post_count": 30
        }))
        .unwrap();
        let html = trip_row(2, &trip, 5).into_string();
        assert!(html.contains("03"));
        assert!(html.contains("+2 more"));
        assert!(html.contains("From May 2022"));
        assert!(html.contains(r#"href="/trips/12""#));
    }

    #[test]
    fn trip_row_without_dates_omits_span() {
        let trip: TripWithCountries =
            serde_json::from_value(json!({"trip_id": 1, "trip_name": "x"})).unwrap();
        let html = trip_row(0, &trip, 5).into_string();
        assert!(!html.contains("class=\"dates\""));
    }

    #[test]
    fn markdown_renders_emphasis() {
        let html = markdown("From **Lima** to *La Paz*.").into_string();
        assert!(html.contains("<strong>Lima</strong>"));
        assert!(html.contains("<em>La Paz</em>"));
    }

    #[test]
    fn stat_uses_separators() {
        let html = stat_item(1234, "Posts").into_string();
        assert!(html.contains("1,234"));
    }
}
