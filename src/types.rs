//! Row types for the journal's relations and views.
//!
//! These mirror what the backend returns for `select=*`. Base tables:
//! `posts`, `media`, `countries`, `trips`, `trip_countries`,
//! `content_blocks`. Views extend a base row with aggregated columns and are
//! modelled with `#[serde(flatten)]` over the base struct, so a
//! [`TripWithCountries`] derefs to the [`Trip`] it extends.
//!
//! Optional columns are `Option`; counters default to zero when a view leaves
//! them out. The frontend never writes, so nothing here serializes.

use crate::blocks::{ContentBlockNpf, Exif, LayoutInfo};
use crate::dates::JournalDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::Deref;

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub post_id: String,
    pub post_date: JournalDate,
    #[serde(default)]
    pub created_at: Option<JournalDate>,
    #[serde(default)]
    pub updated_at: Option<JournalDate>,
    #[serde(default)]
    pub tumblr_timestamp: Option<i64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub note_count: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlockNpf>,
    #[serde(default)]
    pub layout_info: Option<LayoutInfo>,
    #[serde(default)]
    pub country_id: Option<i64>,
    #[serde(default)]
    pub trip_id: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    /// Stored as a Postgres point or text depending on the column type.
    #[serde(default)]
    pub coordinates: Option<serde_json::Value>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub companions: Option<Vec<String>>,
    #[serde(default)]
    pub travel_mode: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub media_count: u64,
    #[serde(default)]
    pub text_blocks_count: u64,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub highlights: Option<Vec<String>>,
}

fn default_state() -> String {
    "published".to_string()
}

impl Post {
    /// Page heading: the title, else the summary's first line, else the date.
    pub fn heading(&self) -> String {
        non_empty(self.title.as_deref())
            .or_else(|| non_empty(self.summary.as_deref()).and_then(|s| s.lines().next()))
            .map(str::to_string)
            .unwrap_or_else(|| crate::display::format_post_date(&self.post_date))
    }

    /// `"Cusco, Cusco Region"`, or the free-form location name.
    pub fn location(&self) -> Option<String> {
        if let Some(name) = non_empty(self.location_name.as_deref()) {
            return Some(name.to_string());
        }
        let parts: Vec<&str> = [self.city.as_deref(), self.region.as_deref()]
            .into_iter()
            .filter_map(non_empty)
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostWithThumbnail {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

impl Deref for PostWithThumbnail {
    type Target = Post;

    fn deref(&self) -> &Post {
        &self.post
    }
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Link,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub media_id: i64,
    pub post_id: String,
    pub block_index: u32,
    #[serde(default)]
    pub display_order: u32,
    pub media_type: MediaType,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    pub original_url: String,
    #[serde(default)]
    pub tumblr_url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub dominant_colors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub exif_data: Option<Exif>,
    #[serde(default)]
    pub camera_make: Option<String>,
    #[serde(default)]
    pub camera_model: Option<String>,
    #[serde(default)]
    pub lens: Option<String>,
    #[serde(default)]
    pub aperture: Option<f64>,
    #[serde(default)]
    pub exposure_time: Option<f64>,
    #[serde(default)]
    pub iso: Option<f64>,
    #[serde(default)]
    pub focal_length: Option<f64>,
    #[serde(default)]
    pub photo_taken_at: Option<JournalDate>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub created_at: Option<JournalDate>,
}

impl Media {
    /// Camera metadata: the extracted columns, filled in from the raw EXIF blob.
    pub fn exif(&self) -> Exif {
        let raw = self.exif_data.clone().unwrap_or_default();
        Exif {
            camera_make: self.camera_make.clone().or(raw.camera_make),
            camera_model: self.camera_model.clone().or(raw.camera_model),
            lens: self.lens.clone().or(raw.lens),
            aperture: self.aperture.or(raw.aperture),
            exposure_time: self.exposure_time.or(raw.exposure_time),
            iso: self.iso.or(raw.iso),
            focal_length: self.focal_length.or(raw.focal_length),
            ..raw
        }
    }
}

// ============================================================================
// Countries
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Country {
    pub country_id: i64,
    pub name: String,
    #[serde(default)]
    pub name_de: Option<String>,
    #[serde(default)]
    pub iso_code: Option<String>,
    #[serde(default)]
    pub iso_code_3: Option<String>,
    #[serde(default)]
    pub continent: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub first_visited: Option<JournalDate>,
    #[serde(default)]
    pub last_visited: Option<JournalDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<JournalDate>,
    #[serde(default)]
    pub updated_at: Option<JournalDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryWithStats {
    #[serde(flatten)]
    pub country: Country,
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub first_post_date: Option<JournalDate>,
    #[serde(default)]
    pub last_post_date: Option<JournalDate>,
    #[serde(default)]
    pub trips: Option<Vec<String>>,
}

impl Deref for CountryWithStats {
    type Target = Country;

    fn deref(&self) -> &Country {
        &self.country
    }
}

impl CountryWithStats {
    pub fn flag(&self) -> Option<String> {
        non_empty(self.iso_code.as_deref()).map(crate::display::country_code_to_flag)
    }

    pub fn trip_names(&self) -> &[String] {
        self.trips.as_deref().unwrap_or(&[])
    }
}

// ============================================================================
// Trips
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub trip_id: i64,
    pub trip_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<JournalDate>,
    #[serde(default)]
    pub end_date: Option<JournalDate>,
    #[serde(default)]
    pub total_distance_km: Option<f64>,
    #[serde(default)]
    pub companions: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<JournalDate>,
    #[serde(default)]
    pub updated_at: Option<JournalDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripWithCountries {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(default)]
    pub countries: Option<Vec<String>>,
    #[serde(default)]
    pub country_codes: Option<Vec<String>>,
    #[serde(default)]
    pub post_count: u64,
}

impl Deref for TripWithCountries {
    type Target = Trip;

    fn deref(&self) -> &Trip {
        &self.trip
    }
}

impl TripWithCountries {
    pub fn country_names(&self) -> &[String] {
        self.countries.as_deref().unwrap_or(&[])
    }

    /// Flags paired with country names, in visit order.
    ///
    /// The view aggregates names and codes in the same order; a missing code
    /// pairs its name with no flag.
    pub fn flagged_countries(&self) -> Vec<(Option<String>, &str)> {
        let codes = self.country_codes.as_deref().unwrap_or(&[]);
        self.country_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let flag = codes
                    .get(i)
                    .and_then(|c| non_empty(Some(c.as_str())))
                    .map(crate::display::country_code_to_flag);
                (flag, name.as_str())
            })
            .collect()
    }

    pub fn date_range(&self) -> String {
        crate::display::journal_date_range(self.start_date.as_ref(), self.end_date.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripCountry {
    pub trip_id: i64,
    pub country_id: i64,
    #[serde(default)]
    pub visit_order: Option<u32>,
    #[serde(default)]
    pub entry_date: Option<JournalDate>,
    #[serde(default)]
    pub exit_date: Option<JournalDate>,
    #[serde(default)]
    pub days_spent: Option<u32>,
}

// ============================================================================
// Content blocks (normalised)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    pub block_id: i64,
    pub post_id: String,
    pub block_index: u32,
    pub block_type: String,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub text_formatting: Option<serde_json::Value>,
    #[serde(default)]
    pub text_subtype: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub link_title: Option<String>,
    #[serde(default)]
    pub link_description: Option<String>,
    #[serde(default)]
    pub layout_row: Option<u32>,
    #[serde(default)]
    pub layout_position: Option<u32>,
    #[serde(default)]
    pub media_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<JournalDate>,
}

// ============================================================================
// Views
// ============================================================================

/// One row of the `timeline` view: a post joined with its country and trip.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineRow {
    pub post_id: String,
    pub post_date: JournalDate,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub companions: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub trip_name: Option<String>,
    #[serde(default)]
    pub media_count: u64,
}

impl TimelineRow {
    pub fn flag(&self) -> Option<String> {
        non_empty(self.country_code.as_deref()).map(crate::display::country_code_to_flag)
    }

    /// `"Cusco · Peru"`, `"Peru"`, or nothing.
    pub fn place(&self) -> Option<String> {
        match (non_empty(self.city.as_deref()), non_empty(self.country.as_deref())) {
            (Some(city), Some(country)) => Some(format!("{city} \u{b7} {country}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        }
    }
}

/// Homepage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub posts: u64,
    pub countries: u64,
    pub trips: u64,
}

/// A single post with its image media, ordered by `(block_index, display_order)`.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostWithThumbnail,
    pub media: Vec<Media>,
}

impl PostDetail {
    /// Image media belonging to one NPF block, in display order.
    pub fn media_for_block(&self, block_index: usize) -> impl Iterator<Item = &Media> {
        self.media
            .iter()
            .filter(move |m| m.block_index as usize == block_index)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timeline_row_minimal() {
        let row: TimelineRow = serde_json::from_value(json!({
            "post_id": "184512",
            "post_date": "2019-05-03T12:00:00+00:00",
            "media_count": 3
        }))
        .unwrap();
        assert_eq!(row.post_id, "184512");
        assert_eq!(row.media_count, 3);
        assert!(row.flag().is_none());
        assert!(row.place().is_none());
    }

    #[test]
    fn timeline_place_and_flag() {
        let row: TimelineRow = serde_json::from_value(json!({
            "post_id": "1",
            "post_date": "2019-05-03",
            "city": "Cusco",
            "country": "Peru",
            "country_code": "pe"
        }))
        .unwrap();
        assert_eq!(row.place().unwrap(), "Cusco \u{b7} Peru");
        assert_eq!(row.flag().unwrap(), "\u{1F1F5}\u{1F1EA}");
    }

    #[test]
    fn trip_view_flattens_base_row() {
        let trip: TripWithCountries = serde_json::from_value(json!({
            "trip_id": 4,
            "trip_name": "South America",
            "start_date": "2019-04-20",
            "end_date": "2019-07-02",
            "countries": ["Peru", "Bolivia"],
            "country_codes": ["PE"],
            "post_count": 41
        }))
        .unwrap();
        assert_eq!(trip.trip_name, "South America");
        assert_eq!(trip.post_count, 41);
        let flagged = trip.flagged_countries();
        assert_eq!(flagged.len(), 2);
        assert!(flagged[0].0.is_some());
        assert_eq!(flagged[1], (None, "Bolivia"));
        assert_eq!(trip.date_range(), "Apr 2019 \u{2013} Jul 2019");
    }

    #[test]
    fn country_view_defaults_counters() {
        let country: CountryWithStats = serde_json::from_value(json!({
            "country_id": 7,
            "name": "Chile",
            "iso_code": "CL"
        }))
        .unwrap();
        assert_eq!(country.total_posts, 0);
        assert_eq!(country.post_count, 0);
        assert!(country.trip_names().is_empty());
        assert!(country.flag().is_some());
    }

    #[test]
    fn media_row_with_unknown_type() {
        let media: Media = serde_json::from_value(json!({
            "media_id": 1,
            "post_id": "p",
            "block_index": 0,
            "media_type": "hologram",
            "original_url": "https://64.media.tumblr.com/x.jpg"
        }))
        .unwrap();
        assert_eq!(media.media_type, MediaType::Other);
        assert_eq!(media.display_order, 0);
    }

    #[test]
    fn media_exif_prefers_columns() {
        let media: Media = serde_json::from_value(json!({
            "media_id": 1,
            "post_id": "p",
            "block_index": 0,
            "media_type": "image",
            "original_url": "u",
            "width": 1600,
            "height": 1200,
            "camera_model": "X100V",
            "exif_data": {"CameraModel": "ignored", "ISO": 400, "Aperture": 2.0}
        }))
        .unwrap();
        let exif = media.exif();
        assert_eq!(exif.camera_model.as_deref(), Some("X100V"));
        assert_eq!(exif.iso, Some(400.0));
    }

    #[test]
    fn post_heading_falls_back() {
        let mut post: Post = serde_json::from_value(json!({
            "post_id": "p",
            "post_date": "2019-05-03T12:00:00",
            "summary": "Arrived in Lima\nLong flight."
        }))
        .unwrap();
        assert_eq!(post.heading(), "Arrived in Lima");
        post.summary = None;
        assert_eq!(post.heading(), "3 May 2019");
        post.title = Some("Lima".into());
        assert_eq!(post.heading(), "Lima");
    }

    #[test]
    fn post_location() {
        let mut post: Post = serde_json::from_value(json!({
            "post_id": "p",
            "post_date": "2019-05-03",
            "city": "Cusco",
            "region": "  "
        }))
        .unwrap();
        assert_eq!(post.location().unwrap(), "Cusco");
        post.location_name = Some("Machu Picchu".into());
        assert_eq!(post.location().unwrap(), "Machu Picchu");
        assert_eq!(post.state, "published");
    }

    #[test]
    fn post_with_thumbnail_keeps_blocks() {
        let post: PostWithThumbnail = serde_json::from_value(json!({
            "post_id": "p",
            "post_date": "2019-05-03",
            "content_blocks": [{"type": "text", "text": "hi"}, {"type": "image"}],
            "layout_info": [{"type": "rows", "display": [{"blocks": [0]}]}],
            "thumbnail_path": "posts/p/thumb.jpg"
        }))
        .unwrap();
        assert_eq!(post.content_blocks.len(), 2);
        assert!(post.layout_info.is_some());
        assert_eq!(post.thumbnail_path.as_deref(), Some("posts/p/thumb.jpg"));
    }
}
