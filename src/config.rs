//! Site configuration module.
//!
//! Handles loading, validating, and merging `travelog.toml`, plus reading the
//! backend credentials from the environment.
//!
//! ## Config File Location
//!
//! `travelog.toml` in the working directory, or any path passed with
//! `--config`. A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "traveling planet earth"
//! tagline = "Private Journal"
//! description = "Notes, photos and routes from a few years on the road."
//! first_year = 2018
//! last_year = 2025
//! private = true       # noindex, nofollow for search engines
//!
//! [colors]
//! ink = "#0d0c0b"      # Primary text
//! paper = "#f4ede0"    # Page background
//! amber = "#c8863a"    # Accent: links, numbers, trip tags
//! smoke = "#1c1a17"    # Secondary text
//! mist = "#2e2b26"     # Borders and rules
//! dust = "#6b6359"     # Muted text: captions, meta lines
//! cream = "#e8dfd0"    # Card background, hero backdrop
//!
//! [pages]
//! recent_posts = 6         # Posts in the homepage grid
//! journal_page_size = 12   # Posts per journal page
//! trip_row_countries = 5   # Countries named per trip row before "+N more"
//!
//! [cache]
//! revalidate_secs = 60     # How long a rendered page is served unchanged
//!
//! [images]
//! resize_base = ""         # e.g. "https://journal.example.com"; empty = no resizing
//! quality = 80
//! widths = [640, 1080, 1600]
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! assets_dir = "assets"
//!
//! [export]
//! concurrency = 8          # Posts rendered at once during export
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.
//!
//! ## Credentials
//!
//! `SUPABASE_URL` and `SUPABASE_ANON_KEY` come from the environment, after a
//! `.env` file in the working directory (if any) has been loaded. They are
//! never read from `travelog.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Site configuration loaded from `travelog.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Titles and the journal's year span.
    pub site: SiteInfo,
    /// Palette emitted as CSS custom properties.
    pub colors: ColorConfig,
    /// Page sizes.
    pub pages: PagesConfig,
    /// Rendered-page cache (serve mode).
    pub cache: CacheConfig,
    /// Image URL rewriting.
    pub images: ImagesConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Static export settings.
    pub export: ExportConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.recent_posts == 0 {
            return Err(ConfigError::Validation(
                "pages.recent_posts must be greater than 0".into(),
            ));
        }
        if self.pages.journal_page_size == 0 {
            return Err(ConfigError::Validation(
                "pages.journal_page_size must be greater than 0".into(),
            ));
        }
        if self.pages.trip_row_countries == 0 {
            return Err(ConfigError::Validation(
                "pages.trip_row_countries must be greater than 0".into(),
            ));
        }
        if self.site.first_year > self.site.last_year {
            return Err(ConfigError::Validation(format!(
                "site.first_year ({}) is after site.last_year ({})",
                self.site.first_year, self.site.last_year
            )));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.widths.is_empty() || self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths must be non-empty and non-zero".into(),
            ));
        }
        if !self.images.resize_base.is_empty() && url::Url::parse(&self.images.resize_base).is_err()
        {
            return Err(ConfigError::Validation(format!(
                "images.resize_base is not a URL: {}",
                self.images.resize_base
            )));
        }
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind is not a socket address: {}",
                self.server.bind
            )));
        }
        if self.export.concurrency == 0 {
            return Err(ConfigError::Validation(
                "export.concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Number of years the journal spans, counted the way the hero shows it.
    pub fn years(&self) -> u32 {
        self.site.last_year.saturating_sub(self.site.first_year)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Wordmark and the suffix of every `<title>`.
    pub title: String,
    /// Eyebrow line above the hero heading.
    pub tagline: String,
    /// `<meta name="description">`.
    pub description: String,
    pub first_year: u32,
    pub last_year: u32,
    /// Emit `<meta name="robots" content="noindex, nofollow">` on every page.
    pub private: bool,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "traveling planet earth".to_string(),
            tagline: "Private Journal".to_string(),
            description: "Notes, photos and routes from a few years on the road.".to_string(),
            first_year: 2018,
            last_year: 2025,
            private: true,
        }
    }
}

impl SiteInfo {
    /// `"2018 – 2025"`, or a single year when both ends match.
    pub fn year_span(&self) -> String {
        if self.first_year == self.last_year {
            self.first_year.to_string()
        } else {
            format!("{} \u{2013} {}", self.first_year, self.last_year)
        }
    }
}

/// Journal palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Primary text.
    pub ink: String,
    /// Page background.
    pub paper: String,
    /// Accent: links, numbers, trip tags.
    pub amber: String,
    /// Secondary text.
    pub smoke: String,
    /// Borders and rules.
    pub mist: String,
    /// Muted text: captions, meta lines.
    pub dust: String,
    /// Card background, hero backdrop.
    pub cream: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            ink: "#0d0c0b".to_string(),
            paper: "#f4ede0".to_string(),
            amber: "#c8863a".to_string(),
            smoke: "#1c1a17".to_string(),
            mist: "#2e2b26".to_string(),
            dust: "#6b6359".to_string(),
            cream: "#e8dfd0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    pub recent_posts: u64,
    pub journal_page_size: u64,
    pub trip_row_countries: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            recent_posts: 6,
            journal_page_size: 12,
            trip_row_countries: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Seconds a rendered page is served before the next request re-renders it.
    /// `0` disables caching.
    pub revalidate_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            revalidate_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Origin serving `/cdn-cgi/image/...`. Empty disables rewriting.
    pub resize_base: String,
    pub quality: u32,
    /// Widths offered in `srcset`, ascending.
    pub widths: Vec<u32>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            resize_base: String::new(),
            quality: 80,
            widths: vec![640, 1080, 1600],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory served under `/assets/` and copied by export.
    pub assets_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub concurrency: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Backend endpoint and public read key.
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub anon_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is normal in production
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        Ok(Self {
            url: get(URL_VAR)?,
            anon_key: get(KEY_VAR)?,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `travelog.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# travelog configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Backend credentials are NOT read from this file. Set SUPABASE_URL and
# SUPABASE_ANON_KEY in the environment or in a .env file.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Wordmark in the header and suffix of every page title.
title = "traveling planet earth"

# Eyebrow line above the homepage heading.
tagline = "Private Journal"

# <meta name="description"> for every page.
description = "Notes, photos and routes from a few years on the road."

# Year span shown in the hero and footer. The "Years" stat is the difference.
first_year = 2018
last_year = 2025

# Ask search engines not to index the journal or follow its links.
private = true

# ---------------------------------------------------------------------------
# Colors (CSS custom properties)
# ---------------------------------------------------------------------------
[colors]
ink = "#0d0c0b"      # Primary text
paper = "#f4ede0"    # Page background
amber = "#c8863a"    # Accent: links, numbers, trip tags
smoke = "#1c1a17"    # Secondary text
mist = "#2e2b26"     # Borders and rules
dust = "#6b6359"     # Muted text: captions, meta lines
cream = "#e8dfd0"    # Card background, hero backdrop

# ---------------------------------------------------------------------------
# Page sizes
# ---------------------------------------------------------------------------
[pages]
# Posts shown in the homepage "Recent" grid.
recent_posts = 6

# Posts per journal page (/journal, /journal/page/N).
journal_page_size = 12

# Countries named in a trip row before "+N more".
trip_row_countries = 5

# ---------------------------------------------------------------------------
# Page cache (serve mode)
# ---------------------------------------------------------------------------
[cache]
# Seconds a rendered page is served unchanged. 0 disables caching.
revalidate_secs = 60

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Origin that serves Cloudflare image resizing under /cdn-cgi/image/.
# Leave empty to link original image URLs.
resize_base = ""

# Resizing quality (1-100).
quality = 80

# Widths offered in srcset.
widths = [640, 1080, 1600]

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:3000"

# Served under /assets/ and copied into static exports.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Static export
# ---------------------------------------------------------------------------
[export]
# Posts rendered concurrently.
concurrency = 8
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --ink: {ink};
    --paper: {paper};
    --amber: {amber};
    --smoke: {smoke};
    --mist: {mist};
    --dust: {dust};
    --cream: {cream};
}}"#,
        ink = colors.ink,
        paper = colors.paper,
        amber = colors.amber,
        smoke = colors.smoke,
        mist = colors.mist,
        dust = colors.dust,
        cream = colors.cream,
    )
}
