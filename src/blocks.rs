//! Typed post content: NPF blocks, layout rows and EXIF.
//!
//! Posts store their body as the Tumblr "Neue Post Format" array in the
//! `content_blocks` JSON column. Each element is tagged by `type`:
//!
//! ```json
//! { "type": "text",  "text": "Day one in Lima", "subtype": "heading1" }
//! { "type": "image", "media": [{ "url": "...", "width": 1280, "height": 960 }],
//!   "exif": { "CameraMake": "Fujifilm", "ISO": 200 } }
//! { "type": "video", "url": "...", "provider": "tumblr" }
//! { "type": "link",  "url": "...", "title": "...", "description": "..." }
//! ```
//!
//! Every known kind gets its own variant; anything else lands in
//! [`ContentBlockNpf::Unknown`] so a new block kind never breaks a whole post.
//! Opaque payloads that no page interprets (`formatting`) stay as
//! [`serde_json::Value`].

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};

/// One NPF content block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlockNpf {
    Text {
        #[serde(default)]
        text: String,
        #[serde(default)]
        subtype: Option<TextSubtype>,
        #[serde(default)]
        formatting: Option<serde_json::Value>,
    },
    Image {
        #[serde(default)]
        media: Vec<MediaNpf>,
        #[serde(default)]
        alt_text: Option<String>,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        colors: Option<BTreeMap<String, String>>,
        #[serde(default)]
        exif: Option<Exif>,
    },
    Video {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        media: Option<MediaNpf>,
        #[serde(default)]
        provider: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        duration: Option<f64>,
    },
    Audio {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        media: Option<MediaNpf>,
        #[serde(default)]
        provider: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        artist: Option<String>,
    },
    Link {
        #[serde(default)]
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlockNpf {
    /// URL of a video/audio block: the top-level `url` wins over `media.url`.
    pub fn playable_url(&self) -> Option<&str> {
        match self {
            Self::Video { url, media, .. } | Self::Audio { url, media, .. } => url
                .as_deref()
                .or_else(|| media.as_ref().map(|m| m.url.as_str()))
                .filter(|u| !u.is_empty()),
            _ => None,
        }
    }
}

/// Text block subtype. Unrecognised subtypes render as plain paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSubtype {
    Heading1,
    Heading2,
    Quirky,
    Quote,
    Indented,
    Chat,
    OrderedListItem,
    UnorderedListItem,
    #[serde(other)]
    Other,
}

/// A media rendition inside an NPF block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaNpf {
    pub url: String,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub has_original_dimensions: bool,
    #[serde(default)]
    pub media_key: Option<String>,
}

/// Pick the widest rendition of an image block (original dimensions first).
pub fn best_rendition(media: &[MediaNpf]) -> Option<&MediaNpf> {
    media
        .iter()
        .find(|m| m.has_original_dimensions)
        .or_else(|| media.iter().max_by_key(|m| m.width.unwrap_or(0)))
}

/// Camera metadata attached to image blocks (PascalCase keys, as Tumblr emits them).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Exif {
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub lens: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub aperture: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub exposure_time: Option<f64>,
    #[serde(default, rename = "ISO", deserialize_with = "lenient_number")]
    pub iso: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub focal_length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub time: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
}

impl Exif {
    /// One-line caption: `"Fujifilm X-T3 · 23mm · f/2.0 · 1/250 s · ISO 200"`.
    ///
    /// Returns `None` when nothing worth showing is present.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();

        let camera = match (&self.camera_make, &self.camera_model) {
            // Models usually repeat the make ("Canon" / "Canon EOS R")
            (Some(make), Some(model)) if model.starts_with(make.as_str()) => Some(model.clone()),
            (Some(make), Some(model)) => Some(format!("{make} {model}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        };
        parts.extend(camera);
        if let Some(lens) = &self.lens {
            parts.push(lens.clone());
        } else if let Some(focal) = self.focal_length {
            parts.push(format!("{}mm", trim_float(focal)));
        }
        if let Some(aperture) = self.aperture {
            parts.push(format!("f/{}", trim_float(aperture)));
        }
        if let Some(exposure) = self.exposure_time.filter(|e| *e > 0.0) {
            parts.push(format_exposure(exposure));
        }
        if let Some(iso) = self.iso {
            parts.push(format!("ISO {}", iso.round() as i64));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" \u{b7} "))
        }
    }
}

/// `0.004` → `"1/250 s"`, `2.0` → `"2 s"`.
fn format_exposure(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{} s", trim_float(seconds))
    } else {
        format!("1/{} s", (1.0 / seconds).round() as i64)
    }
}

/// Drop a trailing `.0`: `2.0` → `"2"`, `2.8` → `"2.8"`.
fn trim_float(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// Accept a JSON number, a numeric string, or anything else as `None`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// ============================================================================
// Layout
// ============================================================================

/// Post layout as stored in `layout_info`.
///
/// The ingestion script stored Tumblr's raw list (`[{"type":"rows",...}]`),
/// older rows hold a single object. Both deserialize into the same shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "LayoutRepr")]
pub struct LayoutInfo {
    pub layouts: Vec<Layout>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LayoutRepr {
    Many(Vec<Layout>),
    One(Layout),
}

impl From<LayoutRepr> for LayoutInfo {
    fn from(repr: LayoutRepr) -> Self {
        match repr {
            LayoutRepr::Many(layouts) => Self { layouts },
            LayoutRepr::One(layout) => Self {
                layouts: vec![layout],
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Layout {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub display: Vec<LayoutRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayoutRow {
    #[serde(default)]
    pub blocks: Vec<usize>,
    #[serde(default)]
    pub mode: Option<LayoutMode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutMode {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Group block indices `0..block_count` into display rows.
///
/// Rows come from the first `rows` layout (or the first layout with a display
/// list when none is typed). Blocks not mentioned by the layout sit in a row of
/// their own. Output follows reading order: a row is emitted where its first
/// block would appear. Out-of-range and repeated indices are dropped.
pub fn layout_rows(block_count: usize, layout: Option<&LayoutInfo>) -> Vec<Vec<usize>> {
    let display = layout
        .and_then(|info| {
            info.layouts
                .iter()
                .find(|l| l.kind.as_deref() == Some("rows"))
                .or_else(|| info.layouts.iter().find(|l| !l.display.is_empty()))
        })
        .map(|l| l.display.as_slice())
        .unwrap_or(&[]);

    let mut seen = HashSet::new();
    let mut row_of = vec![None; block_count];
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for row in display {
        let members: Vec<usize> = row
            .blocks
            .iter()
            .copied()
            .filter(|&i| i < block_count && seen.insert(i))
            .collect();
        if members.is_empty() {
            continue;
        }
        for &i in &members {
            row_of[i] = Some(rows.len());
        }
        rows.push(members);
    }

    let mut emitted = vec![false; rows.len()];
    let mut out = Vec::new();
    for (i, slot) in row_of.iter().enumerate() {
        match slot {
            Some(r) if !emitted[*r] => {
                emitted[*r] = true;
                out.push(rows[*r].clone());
            }
            Some(_) => {}
            None => out.push(vec![i]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(json: &str) -> Vec<ContentBlockNpf> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_known_block_kinds() {
        let parsed = blocks(
            r#"[
                {"type": "text", "text": "Lima", "subtype": "heading1"},
                {"type": "image", "media": [{"url": "https://64.media.tumblr.com/a.jpg", "width": 1280}]},
                {"type": "video", "url": "https://va.media.tumblr.com/v.mp4", "provider": "tumblr"},
                {"type": "audio", "media": {"url": "https://a.tumblr.com/x.mp3"}},
                {"type": "link", "url": "https://example.com", "title": "Example"}
            ]"#,
        );
        assert_eq!(parsed.len(), 5);
        assert!(matches!(
            &parsed[0],
            ContentBlockNpf::Text { text, subtype: Some(TextSubtype::Heading1), .. } if text == "Lima"
        ));
        assert!(matches!(&parsed[1], ContentBlockNpf::Image { media, .. } if media.len() == 1));
        assert_eq!(parsed[2].playable_url(), Some("https://va.media.tumblr.com/v.mp4"));
        assert_eq!(parsed[3].playable_url(), Some("https://a.tumblr.com/x.mp3"));
        assert!(matches!(&parsed[4], ContentBlockNpf::Link { title: Some(t), .. } if t == "Example"));
    }

    #[test]
    fn unknown_kind_falls_back() {
        let parsed = blocks(r#"[{"type": "poll", "question": "?"}, {"type": "text"}]"#);
        assert_eq!(parsed[0], ContentBlockNpf::Unknown);
        assert!(matches!(&parsed[1], ContentBlockNpf::Text { text, .. } if text.is_empty()));
    }

    #[test]
    fn unknown_subtype_is_other() {
        let parsed = blocks(r#"[{"type": "text", "text": "x", "subtype": "sparkle"}]"#);
        assert!(matches!(
            &parsed[0],
            ContentBlockNpf::Text { subtype: Some(TextSubtype::Other), .. }
        ));
    }

    #[test]
    fn list_subtypes_are_kebab_case() {
        let parsed = blocks(
            r#"[{"type": "text", "text": "a", "subtype": "ordered-list-item"},
                {"type": "text", "text": "b", "subtype": "unordered-list-item"}]"#,
        );
        assert!(matches!(&parsed[0], ContentBlockNpf::Text { subtype: Some(TextSubtype::OrderedListItem), .. }));
        assert!(matches!(&parsed[1], ContentBlockNpf::Text { subtype: Some(TextSubtype::UnorderedListItem), .. }));
    }

    #[test]
    fn best_rendition_prefers_original() {
        let media: Vec<MediaNpf> = serde_json::from_str(
            r#"[{"url": "big", "width": 2048}, {"url": "orig", "width": 1280, "has_original_dimensions": true}]"#,
        )
        .unwrap();
        assert_eq!(best_rendition(&media).unwrap().url, "orig");
    }

    #[test]
    fn best_rendition_falls_back_to_widest() {
        let media: Vec<MediaNpf> =
            serde_json::from_str(r#"[{"url": "small", "width": 400}, {"url": "big", "width": 2048}]"#)
                .unwrap();
        assert_eq!(best_rendition(&media).unwrap().url, "big");
        assert!(best_rendition(&[]).is_none());
    }

    #[test]
    fn exif_summary_full() {
        let exif: Exif = serde_json::from_str(
            r#"{"CameraMake": "Fujifilm", "CameraModel": "X-T3", "Lens": "XF23mmF2 R WR",
                "Aperture": 2.0, "ExposureTime": 0.004, "ISO": 200}"#,
        )
        .unwrap();
        assert_eq!(
            exif.summary().unwrap(),
            "Fujifilm X-T3 \u{b7} XF23mmF2 R WR \u{b7} f/2 \u{b7} 1/250 s \u{b7} ISO 200"
        );
    }

    #[test]
    fn exif_model_repeating_make_is_not_doubled() {
        let exif = Exif {
            camera_make: Some("Canon".into()),
            camera_model: Some("Canon EOS R".into()),
            focal_length: Some(35.0),
            ..Default::default()
        };
        assert_eq!(exif.summary().unwrap(), "Canon EOS R \u{b7} 35mm");
    }

    #[test]
    fn exif_accepts_numeric_strings() {
        let exif: Exif = serde_json::from_str(r#"{"Aperture": "2.8", "ISO": "bogus"}"#).unwrap();
        assert_eq!(exif.aperture, Some(2.8));
        assert_eq!(exif.iso, None);
    }

    #[test]
    fn exif_summary_empty() {
        assert_eq!(Exif::default().summary(), None);
    }

    #[test]
    fn layout_accepts_list_and_object() {
        let many: LayoutInfo =
            serde_json::from_str(r#"[{"type": "rows", "display": [{"blocks": [0, 1]}]}]"#).unwrap();
        let one: LayoutInfo =
            serde_json::from_str(r#"{"display": [{"blocks": [0, 1]}]}"#).unwrap();
        assert_eq!(many.layouts[0].display[0].blocks, vec![0, 1]);
        assert_eq!(one.layouts[0].display[0].blocks, vec![0, 1]);
    }

    #[test]
    fn layout_rows_without_layout_is_one_block_per_row() {
        assert_eq!(layout_rows(3, None), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn layout_rows_groups_and_keeps_reading_order() {
        let info: LayoutInfo = serde_json::from_str(
            r#"[{"type": "rows", "display": [{"blocks": [1, 2]}, {"blocks": [0]}, {"blocks": [4]}]}]"#,
        )
        .unwrap();
        assert_eq!(
            layout_rows(5, Some(&info)),
            vec![vec![0], vec![1, 2], vec![3], vec![4]]
        );
    }

    #[test]
    fn layout_rows_drops_bad_indices() {
        let info: LayoutInfo = serde_json::from_str(
            r#"{"display": [{"blocks": [0, 9]}, {"blocks": [0, 1]}]}"#,
        )
        .unwrap();
        assert_eq!(layout_rows(2, Some(&info)), vec![vec![0], vec![1]]);
    }
}
