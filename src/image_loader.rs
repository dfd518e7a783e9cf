//! Image URL rewriting for the resizing edge.
//!
//! Photos live on Tumblr's CDN (`64.media.tumblr.com`) or in Supabase storage
//! (`*.supabase.co`). When `images.resize_base` is set, those URLs are routed
//! through Cloudflare image resizing:
//!
//! ```text
//! {resize_base}/cdn-cgi/image/width=1080,quality=80,format=auto/{original url}
//! ```
//!
//! Any other host, or an empty `resize_base`, leaves the URL untouched. No
//! image bytes are ever fetched or transformed here.

use crate::config::ImagesConfig;
use url::Url;

const TUMBLR_MEDIA_HOST: &str = "64.media.tumblr.com";
const SUPABASE_SUFFIX: &str = ".supabase.co";

/// Whether `src` is on a host the resizing edge is allowed to fetch from.
pub fn is_allowed_host(src: &str) -> bool {
    let Ok(url) = Url::parse(src) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host_str() {
        Some(host) => host == TUMBLR_MEDIA_HOST || host.ends_with(SUPABASE_SUFFIX),
        None => false,
    }
}

fn rewriting_enabled(config: &ImagesConfig, src: &str) -> bool {
    !config.resize_base.is_empty() && is_allowed_host(src)
}

/// URL for `src` scaled to `width`.
pub fn resized_url(src: &str, width: u32, config: &ImagesConfig) -> String {
    if !rewriting_enabled(config, src) {
        return src.to_string();
    }
    format!(
        "{}/cdn-cgi/image/width={},quality={},format=auto/{}",
        config.resize_base.trim_end_matches('/'),
        width,
        config.quality,
        src
    )
}

/// `srcset` over the configured widths, or `None` when `src` is not rewritten.
///
/// Widths wider than the known intrinsic width are dropped (the edge would
/// only upscale), keeping at least the smallest.
pub fn srcset(src: &str, intrinsic_width: Option<u32>, config: &ImagesConfig) -> Option<String> {
    if !rewriting_enabled(config, src) {
        return None;
    }
    let mut widths: Vec<u32> = config.widths.clone();
    widths.sort_unstable();
    widths.dedup();
    if let Some(max) = intrinsic_width {
        let smallest = widths.first().copied();
        widths.retain(|w| *w <= max);
        if widths.is_empty() {
            widths.extend(smallest);
        }
    }
    let entries: Vec<String> = widths
        .iter()
        .map(|w| format!("{} {}w", resized_url(src, *w, config), w))
        .collect();
    (!entries.is_empty()).then(|| entries.join(", "))
}

/// Default `src` for an `<img>`: the middle configured width.
pub fn display_url(src: &str, config: &ImagesConfig) -> String {
    let mut widths = config.widths.clone();
    widths.sort_unstable();
    match widths.get(widths.len() / 2) {
        Some(w) => resized_url(src, *w, config),
        None => src.to_string(),
    }
}
