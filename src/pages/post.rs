//! Single post page: header, NPF blocks in layout rows, footer.
//!
//! Blocks render in reading order, grouped side by side where the layout says
//! so. Image blocks prefer the post's `media` rows for that block index (they
//! carry dimensions, captions and EXIF columns) and fall back to the largest
//! rendition inside the block itself. Consecutive list items collapse into a
//! single `<ol>`/`<ul>`. Unknown block kinds are skipped.

use super::layout::{Section, base_document};
use crate::blocks::{ContentBlockNpf, MediaNpf, TextSubtype, best_rendition, layout_rows};
use crate::config::{ImagesConfig, SiteConfig};
use crate::display::format_post_date;
use crate::image_loader;
use crate::types::{Media, PostDetail};
use maud::{Markup, html};

/// An image ready to render, from either source.
struct Picture<'a> {
    url: &'a str,
    width: Option<u32>,
    height: Option<u32>,
    alt: Option<&'a str>,
    caption: Option<String>,
}

impl<'a> Picture<'a> {
    fn from_media(media: &'a Media, block_alt: Option<&'a str>) -> Self {
        Self {
            url: &media.original_url,
            width: media.width,
            height: media.height,
            alt: media.alt_text.as_deref().or(block_alt),
            caption: caption_line(media.caption.as_deref(), media.exif().summary()),
        }
    }

    fn from_npf(media: &'a MediaNpf, alt: Option<&'a str>, caption: Option<String>) -> Self {
        Self {
            url: &media.url,
            width: media.width,
            height: media.height,
            alt,
            caption,
        }
    }
}

/// Caption text and EXIF line joined, either may be absent.
fn caption_line(caption: Option<&str>, exif: Option<String>) -> Option<String> {
    let caption = caption.map(str::trim).filter(|c| !c.is_empty());
    match (caption, exif) {
        (Some(c), Some(e)) => Some(format!("{c} \u{2014} {e}")),
        (Some(c), None) => Some(c.to_string()),
        (None, e) => e,
    }
}

fn picture(p: &Picture<'_>, sizes: &str, images: &ImagesConfig) -> Markup {
    let srcset = image_loader::srcset(p.url, p.width, images);
    html! {
        figure.post-image {
            img src=(image_loader::display_url(p.url, images))
                srcset=[srcset.as_deref()]
                sizes=[srcset.is_some().then_some(sizes)]
                width=[p.width]
                height=[p.height]
                alt=(p.alt.unwrap_or(""))
                loading="lazy";
            @if let Some(caption) = &p.caption {
                figcaption { (caption) }
            }
        }
    }
}

fn image_block(
    detail: &PostDetail,
    index: usize,
    block: &ContentBlockNpf,
    sizes: &str,
    images: &ImagesConfig,
) -> Markup {
    let ContentBlockNpf::Image {
        media,
        alt_text,
        caption,
        exif,
        ..
    } = block
    else {
        return html! {};
    };
    let rows: Vec<&Media> = detail.media_for_block(index).collect();
    let pictures: Vec<Picture<'_>> = if rows.is_empty() {
        best_rendition(media)
            .map(|m| {
                let exif = exif.as_ref().and_then(|e| e.summary());
                Picture::from_npf(m, alt_text.as_deref(), caption_line(caption.as_deref(), exif))
            })
            .into_iter()
            .collect()
    } else {
        rows.into_iter()
            .map(|m| Picture::from_media(m, alt_text.as_deref()))
            .collect()
    };
    html! {
        @for p in &pictures {
            (picture(p, sizes, images))
        }
    }
}

fn text_block(text: &str, subtype: Option<TextSubtype>) -> Markup {
    match subtype {
        Some(TextSubtype::Heading1) => html! { h2 { (text) } },
        Some(TextSubtype::Heading2) => html! { h3 { (text) } },
        Some(TextSubtype::Quote) => html! { blockquote { p { (text) } } },
        Some(TextSubtype::Indented) => html! { blockquote.indented { p { (text) } } },
        Some(TextSubtype::Chat) => html! { p.chat { (text) } },
        Some(TextSubtype::Quirky) => html! { p.quirky { (text) } },
        // List items are grouped by the caller
        Some(TextSubtype::OrderedListItem | TextSubtype::UnorderedListItem)
        | Some(TextSubtype::Other)
        | None => html! { p { (text) } },
    }
}

fn link_host(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

fn render_block(
    detail: &PostDetail,
    index: usize,
    block: &ContentBlockNpf,
    sizes: &str,
    config: &SiteConfig,
) -> Markup {
    match block {
        ContentBlockNpf::Text { text, subtype, .. } => text_block(text, *subtype),
        ContentBlockNpf::Image { .. } => image_block(detail, index, block, sizes, &config.images),
        ContentBlockNpf::Video { provider, .. } => match block.playable_url() {
            Some(url) if provider.as_deref().is_none_or(|p| p == "tumblr") => html! {
                figure.post-video {
                    video controls preload="metadata" src=(url) {}
                }
            },
            Some(url) => html! {
                p.post-video-link {
                    a href=(url) rel="noopener" {
                        "Watch on " (provider.as_deref().unwrap_or("the web"))
                    }
                }
            },
            None => html! {},
        },
        ContentBlockNpf::Audio { title, artist, .. } => match block.playable_url() {
            Some(url) => html! {
                figure.post-audio {
                    audio controls preload="none" src=(url) {}
                    @if title.is_some() || artist.is_some() {
                        figcaption {
                            @if let Some(title) = title { (title) }
                            @if title.is_some() && artist.is_some() { " \u{2014} " }
                            @if let Some(artist) = artist { (artist) }
                        }
                    }
                }
            },
            None => html! {},
        },
        ContentBlockNpf::Link {
            url,
            title,
            description,
        } if !url.is_empty() => html! {
            a.link-card href=(url) rel="noopener" {
                span.link-title { (title.as_deref().unwrap_or(url.as_str())) }
                @if let Some(description) = description {
                    span.link-description { (description) }
                }
                @if let Some(host) = link_host(url) {
                    span.link-host { (host) }
                }
            }
        },
        ContentBlockNpf::Link { .. } | ContentBlockNpf::Unknown => html! {},
    }
}

/// A run of display rows: either one layout row or consecutive list items.
enum Segment<'a> {
    Row(&'a [usize]),
    List(TextSubtype, Vec<&'a str>),
}

/// List subtype and text of a single-block row, if it is a list item.
fn list_item<'a>(row: &[usize], blocks: &'a [ContentBlockNpf]) -> Option<(TextSubtype, &'a str)> {
    let [i] = row else {
        return None;
    };
    match blocks.get(*i)? {
        ContentBlockNpf::Text {
            text,
            subtype: Some(s @ (TextSubtype::OrderedListItem | TextSubtype::UnorderedListItem)),
            ..
        } => Some((*s, text.as_str())),
        _ => None,
    }
}

fn segments<'a>(rows: &'a [Vec<usize>], blocks: &'a [ContentBlockNpf]) -> Vec<Segment<'a>> {
    let mut out: Vec<Segment<'a>> = Vec::new();
    for row in rows {
        let Some((kind, text)) = list_item(row, blocks) else {
            out.push(Segment::Row(row));
            continue;
        };
        if let Some(Segment::List(current, items)) = out.last_mut() {
            if *current == kind {
                items.push(text);
                continue;
            }
        }
        out.push(Segment::List(kind, vec![text]));
    }
    out
}

fn render_body(detail: &PostDetail, config: &SiteConfig) -> Markup {
    let blocks = &detail.post.content_blocks;
    let rows = layout_rows(blocks.len(), detail.post.layout_info.as_ref());

    html! {
        div.post-body {
            @for segment in segments(&rows, blocks) {
                @match segment {
                    Segment::List(TextSubtype::OrderedListItem, items) => {
                        ol { @for item in &items { li { (item) } } }
                    }
                    Segment::List(_, items) => {
                        ul { @for item in &items { li { (item) } } }
                    }
                    Segment::Row(row) => {
                        @let sizes = if row.len() > 1 {
                            "(max-width: 800px) 100vw, 50vw"
                        } else {
                            "(max-width: 800px) 100vw, 800px"
                        };
                        div class={ "block-row cols-" (row.len()) } {
                            @for &idx in row {
                                (render_block(detail, idx, &blocks[idx], sizes, config))
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn render_post(config: &SiteConfig, detail: &PostDetail) -> Markup {
    let post = &detail.post;
    let heading = post.heading();
    let show_summary = post.title.as_deref().is_some_and(|t| !t.trim().is_empty());

    let content = html! {
        article.post-page {
            header.post-header {
                time datetime=(post.post_date.to_string()) { (format_post_date(&post.post_date)) }
                h1 { (heading) }
                @if let Some(location) = post.location() {
                    p.location { (location) }
                }
                @if show_summary {
                    @if let Some(summary) = post.summary.as_deref().filter(|s| !s.trim().is_empty()) {
                        p.summary { (summary) }
                    }
                }
            }
            (render_body(detail, config))
            footer.post-footer {
                @if let Some(tags) = post.tags.as_ref().filter(|t| !t.is_empty()) {
                    ul.tags {
                        @for tag in tags { li.tag { "#" (tag) } }
                    }
                }
                @if let Some(companions) = post.companions.as_ref().filter(|c| !c.is_empty()) {
                    p.companions { "With " (companions.join(", ")) }
                }
                nav.post-nav {
                    @if let Some(trip_id) = post.trip_id {
                        a href={ "/trips/" (trip_id) } { "\u{2190} Back to the trip" }
                    }
                    a href="/journal" { "Journal" }
                }
            }
        }
    };
    base_document(Some(&heading), config, Section::Journal, content)
}
