//! Static export: render every route to `<output>/<route>/index.html`.
//!
//! Export walks the journal the way a visitor would: the fixed pages first,
//! then every trip from the trip list, every journal page, and every post
//! found on those journal pages. Rendering goes through the same
//! [`render_route`](crate::pages::render_route) as serve mode, so an exported
//! file is byte-identical to what the server would answer.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── trips/index.html
//! ├── trips/4/index.html
//! ├── countries/index.html
//! ├── map/index.html
//! ├── journal/index.html
//! ├── journal/page/2/index.html
//! ├── post/184512/index.html
//! └── assets/...
//! ```
//!
//! Pages render at most `export.concurrency` at a time and are written in
//! route order. A route that comes back not-found (a post deleted between
//! listing and rendering) is skipped and reported; any backend failure
//! aborts the export. Post ids that are not URL-safe never become routes,
//! so every written file stays under the output directory.

use crate::backend::Backend;
use crate::config::SiteConfig;
use crate::pages::{self, PageError, PageStatus, RenderedPage, Route, journal};
use crate::queries::{self, QueryError};
use futures::stream::{self, StreamExt};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const NOT_FOUND_FILE: &str = "404.html";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("could not list routes: {0}")]
    Query(#[from] QueryError),
    #[error("could not render page: {0}")]
    Page(#[from] PageError),
    #[error("could not copy assets: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One written page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPage {
    pub route: Route,
    /// Human name for the listing: trip name, post title, "Page 2".
    pub label: String,
    /// Path relative to the output directory.
    pub file: String,
}

/// What an export wrote, for the CLI summary.
#[derive(Debug, Clone, Default)]
pub struct ExportManifest {
    pub output_dir: PathBuf,
    pub pages: Vec<ExportedPage>,
    /// Routes listed by the journal that rendered as not-found.
    pub skipped: Vec<Route>,
    /// Timeline post ids that are not URL-safe and were not exported.
    pub rejected: Vec<String>,
    /// Files copied from the assets directory.
    pub assets: Vec<String>,
}

impl ExportManifest {
    pub fn trips(&self) -> impl Iterator<Item = &ExportedPage> {
        self.pages.iter().filter(|p| matches!(p.route, Route::Trip(_)))
    }

    pub fn journal_pages(&self) -> impl Iterator<Item = &ExportedPage> {
        self.pages
            .iter()
            .filter(|p| matches!(p.route, Route::Journal(_)))
    }

    pub fn posts(&self) -> impl Iterator<Item = &ExportedPage> {
        self.pages.iter().filter(|p| matches!(p.route, Route::Post(_)))
    }

    /// Home, trips, countries and map.
    pub fn fixed_pages(&self) -> impl Iterator<Item = &ExportedPage> {
        self.pages.iter().filter(|p| {
            matches!(
                p.route,
                Route::Home | Route::Trips | Route::Countries | Route::Map
            )
        })
    }
}

/// Export the whole journal into `output_dir`, copying `assets_dir` (when it
/// exists) to `output_dir/assets`.
pub async fn export_site(
    backend: &dyn Backend,
    config: &SiteConfig,
    output_dir: &Path,
    assets_dir: &Path,
) -> Result<ExportManifest, ExportError> {
    fs::create_dir_all(output_dir)?;
    let mut manifest = ExportManifest {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };

    let RouteList { routes, rejected } = collect_routes(backend, config).await?;
    for id in &rejected {
        warn!(post_id = %id, "post id is not URL-safe, skipping");
    }
    manifest.rejected = rejected;
    info!(pages = routes.len(), "exporting journal");

    let concurrency = config.export.concurrency.max(1);
    let mut rendered = stream::iter(routes)
        .map(|(route, label)| async move {
            let page = pages::render_route(backend, config, &route).await?;
            Ok::<_, PageError>((route, label, page))
        })
        .buffered(concurrency);

    while let Some(result) = rendered.next().await {
        let (route, label, page) = result?;
        if page.status == PageStatus::NotFound {
            warn!(path = %route.path(), "listed page not found, skipping");
            manifest.skipped.push(route);
            continue;
        }
        let file = route.output_file();
        write_page(output_dir, &file, &page)?;
        debug!(%file, "wrote page");
        manifest.pages.push(ExportedPage { route, label, file });
    }

    write_page(output_dir, NOT_FOUND_FILE, &RenderedPage::not_found(config))?;

    if assets_dir.is_dir() {
        manifest.assets = copy_assets(assets_dir, &output_dir.join("assets"))?;
        debug!(count = manifest.assets.len(), "copied assets");
    } else {
        debug!(dir = %assets_dir.display(), "no assets directory");
    }

    info!(
        pages = manifest.pages.len(),
        skipped = manifest.skipped.len(),
        output = %output_dir.display(),
        "export finished"
    );
    Ok(manifest)
}

/// Routes to export with their listing labels, in output order.
#[derive(Debug, Default)]
struct RouteList {
    routes: Vec<(Route, String)>,
    rejected: Vec<String>,
}

async fn collect_routes(backend: &dyn Backend, config: &SiteConfig) -> Result<RouteList, QueryError> {
    let (trips, total) = tokio::try_join!(
        queries::get_trips_with_countries(backend),
        queries::get_timeline_total(backend),
    )?;

    let mut routes = vec![
        (Route::Home, "Home".to_string()),
        (Route::Trips, "Trips".to_string()),
        (Route::Countries, "Countries".to_string()),
        (Route::Map, "Map".to_string()),
    ];
    routes.extend(
        trips
            .iter()
            .map(|t| (Route::Trip(t.trip_id), t.trip_name.clone())),
    );

    let size = config.pages.journal_page_size;
    let page_count = journal::page_count(total, size);
    routes.extend((1..=page_count).map(|n| (Route::Journal(n), format!("Page {n}"))));

    let timeline_pages: Vec<_> = stream::iter(0..page_count)
        .map(|page| queries::get_timeline(backend, page, size))
        .buffered(config.export.concurrency.max(1))
        .collect()
        .await;
    let mut rejected = Vec::new();
    for rows in timeline_pages {
        for row in rows? {
            let Some(route) = Route::post(&row.post_id) else {
                rejected.push(row.post_id);
                continue;
            };
            let label = row
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(row.post_id.as_str())
                .to_string();
            routes.push((route, label));
        }
    }
    Ok(RouteList { routes, rejected })
}

fn write_page(output_dir: &Path, file: &str, page: &RenderedPage) -> io::Result<()> {
    let path = output_dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &page.html)
}

/// Copy a directory tree, returning the copied files relative to `src`.
fn copy_assets(src: &Path, dst: &Path) -> Result<Vec<String>, ExportError> {
    let mut copied = Vec::new();
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(copied)
}
