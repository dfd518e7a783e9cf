//! Paginated journal: the whole timeline, newest first.

use super::Route;
use super::components::post_grid;
use super::layout::{Section, base_document, section_header};
use crate::config::SiteConfig;
use crate::types::TimelineRow;
use maud::{Markup, html};

/// Number of journal pages for `total` rows. An empty journal still has
/// one (empty) page.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

fn pager(page: u64, pages: u64) -> Markup {
    html! {
        nav.pager {
            @if page > 1 {
                a.newer href=(Route::Journal(page - 1).path()) rel="prev" { "\u{2190} Newer" }
            }
            span.page-of { "Page " (page) " of " (pages) }
            @if page < pages {
                a.older href=(Route::Journal(page + 1).path()) rel="next" { "Older \u{2192}" }
            }
        }
    }
}

/// `page` is 1-based.
pub fn render_journal(config: &SiteConfig, page: u64, pages: u64, rows: &[TimelineRow]) -> Markup {
    let title = if page > 1 {
        format!("Journal, page {page}")
    } else {
        "Journal".to_string()
    };
    let content = html! {
        section.journal-section {
            (section_header("Everything", "The Journal", None))
            @if rows.is_empty() {
                p.empty { "Nothing written yet." }
            } @else {
                (post_grid(rows))
            }
            (pager(page, pages))
        }
    };
    base_document(Some(&title), config, Section::Journal, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SnapshotBackend;
    use crate::pages::{Route, render_route};
    use crate::test_helpers::*;

    #[test]
    fn page_counts() {
        assert_eq!(page_count(0, 12), 1);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(page_count(608, 12), 51);
    }

    #[test]
    fn pager_links() {
        let first = pager(1, 3).into_string();
        assert!(!first.contains("Newer"));
        assert!(first.contains(r#"href="/journal/page/2""#));

        let middle = pager(2, 3).into_string();
        assert!(middle.contains(r#"href="/journal""#));
        assert!(middle.contains(r#"href="/journal/page/3""#));

        let last = pager(3, 3).into_string();
        assert!(!last.contains("Older"));
    }

    #[tokio::test]
    async fn second_page_continues_the_first() {
        let backend = sample_backend();
        let mut config = SiteConfig::default();
        config.pages.journal_page_size = 2;

        let first = render_route(&backend, &config, &Route::Journal(1)).await.unwrap();
        let second = render_route(&backend, &config, &Route::Journal(2)).await.unwrap();
        let third = render_route(&backend, &config, &Route::Journal(3)).await.unwrap();

        assert_html_contains(&first, &["/post/210050", "/post/210001", "Page 1 of 3"]);
        assert_html_contains(&second, &["/post/184620", "/post/184512", "Page 2 of 3"]);
        assert_html_contains(&third, &["/post/184400"]);
        assert_html_lacks(&third, &["Older"]);
    }

    #[tokio::test]
    async fn empty_journal_says_so() {
        let backend = SnapshotBackend::default().with_relation("timeline", vec![]);
        let page = render_path(&backend, "/journal").await;
        assert_html_contains(&page, &["Nothing written yet.", "Page 1 of 1"]);
    }
}
