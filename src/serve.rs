//! Serve mode: render pages on request behind the revalidation cache.
//!
//! One catch-all handler resolves the path to a [`Route`], consults the
//! [`PageCache`], renders on a miss or stale entry and answers with the HTML,
//! its ETag and a `Cache-Control` matching the revalidation window. A
//! matching `If-None-Match` gets a 304. `/assets/*` serves files from the
//! configured assets directory.
//!
//! | Outcome | Status | Cached |
//! |---------|--------|--------|
//! | page rendered | 200 | yes |
//! | unknown path, missing post/trip, journal page past the end | 404 | no |
//! | backend failure with a stale copy | 200 (stale copy) | kept |
//! | backend failure without one | 502 | no |

use crate::backend::Backend;
use crate::cache::{self, CachedPage, Lookup, PageCache};
use crate::config::SiteConfig;
use crate::pages::{self, RenderedPage, Route, errors};
use actix_web::dev::Service;
use actix_web::http::header::{self, CacheControl, CacheDirective, ContentType};
use actix_web::http::{Method, StatusCode};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("could not bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a request handler needs, shared across workers.
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub config: SiteConfig,
    pub cache: PageCache,
    pub assets_dir: PathBuf,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, config: SiteConfig) -> Self {
        let cache = PageCache::new(Duration::from_secs(config.cache.revalidate_secs));
        let assets_dir = PathBuf::from(&config.server.assets_dir);
        Self {
            backend,
            config,
            cache,
            assets_dir,
        }
    }

    fn max_age(&self) -> u32 {
        u32::try_from(self.config.cache.revalidate_secs).unwrap_or(u32::MAX)
    }
}

/// Register the asset route and the page handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/assets/{tail:.*}", web::get().to(asset))
        .default_service(web::to(page));
}

/// Bind and run until shutdown.
pub async fn run(state: AppState, bind: &str) -> Result<(), ServeError> {
    let state = web::Data::new(state);
    info!(bind, assets = %state.assets_dir.display(), "serving journal");

    let server = HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .app_data(state.clone())
                .wrap_fn(|req, srv| {
                    let start = Instant::now();
                    let method = req.method().clone();
                    let path = req.path().to_string();
                    let fut = srv.call(req);
                    async move {
                        let res = fut.await?;
                        info!(
                            %method,
                            %path,
                            status = res.status().as_u16(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "request"
                        );
                        Ok(res)
                    }
                })
                .configure(configure)
        }
    })
    .bind(bind)
    .map_err(|source| ServeError::Bind {
        addr: bind.to_string(),
        source,
    })?;

    server.run().await?;
    info!(cache = %state.cache.stats(), "server stopped");
    Ok(())
}

// ============================================================================
// Pages
// ============================================================================

async fn page(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if !matches!(*req.method(), Method::GET | Method::HEAD) {
        return HttpResponse::MethodNotAllowed()
            .insert_header((header::ALLOW, "GET, HEAD"))
            .finish();
    }
    let Some(route) = Route::parse(req.path()) else {
        return html_response(StatusCode::NOT_FOUND, RenderedPage::not_found(&state.config).html);
    };

    let now = Instant::now();
    let stale = match state.cache.lookup(&route, now) {
        Lookup::Fresh(cached) => {
            debug!(path = %route.path(), "cache hit");
            return cached_response(&req, &state, &cached);
        }
        Lookup::Stale(cached) => Some(cached),
        Lookup::Miss => None,
    };

    match pages::render_route(state.backend.as_ref(), &state.config, &route).await {
        Ok(rendered) => match state.cache.store(route, rendered, now) {
            Ok(cached) => cached_response(&req, &state, &cached),
            Err(uncached) => html_response(StatusCode::NOT_FOUND, uncached.html),
        },
        Err(e) => match stale {
            Some(cached) => {
                warn!(path = %route.path(), error = %e, "render failed, serving stale copy");
                cached_response(&req, &state, &cached)
            }
            None => {
                error!(path = %route.path(), error = %e, "render failed");
                html_response(
                    StatusCode::BAD_GATEWAY,
                    errors::render_backend_error(&state.config).into_string(),
                )
            }
        },
    }
}

fn html_response(status: StatusCode, html: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .insert_header(CacheControl(vec![CacheDirective::NoCache]))
        .body(html)
}

fn if_none_match(req: &HttpRequest, etag: &str) -> bool {
    req.headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| cache::etag_matches(v, etag))
}

fn cached_response(req: &HttpRequest, state: &AppState, cached: &CachedPage) -> HttpResponse {
    let cache_control = CacheControl(vec![
        CacheDirective::Public,
        CacheDirective::MaxAge(state.max_age()),
    ]);
    if if_none_match(req, &cached.etag) {
        return HttpResponse::NotModified()
            .insert_header((header::ETAG, cached.etag.as_str()))
            .insert_header(cache_control)
            .finish();
    }
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .insert_header((header::ETAG, cached.etag.as_str()))
        .insert_header(cache_control)
        .body(cached.html.to_string())
}

// ============================================================================
// Assets
// ============================================================================

/// Resolve an asset request under `root`. Anything but plain path segments
/// (`..`, absolute paths, prefixes) is rejected.
pub fn asset_path(root: &Path, tail: &str) -> Option<PathBuf> {
    let relative = Path::new(tail);
    if tail.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

/// Content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        Some("txt") => "text/plain; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn asset(
    req: HttpRequest,
    tail: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let not_found = || html_response(StatusCode::NOT_FOUND, RenderedPage::not_found(&state.config).html);
    let Some(path) = asset_path(&state.assets_dir, &tail) else {
        warn!(path = %req.path(), "rejected asset path");
        return not_found();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let etag = cache::etag_for_bytes(&bytes);
            let cache_control = CacheControl(vec![
                CacheDirective::Public,
                CacheDirective::MaxAge(state.max_age()),
            ]);
            if if_none_match(&req, &etag) {
                return HttpResponse::NotModified()
                    .insert_header((header::ETAG, etag))
                    .insert_header(cache_control)
                    .finish();
            }
            HttpResponse::Ok()
                .content_type(content_type_for(&path))
                .insert_header((header::ETAG, etag))
                .insert_header(cache_control)
                .body(bytes)
        }
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
            not_found()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not read asset");
            HttpResponse::InternalServerError().finish()
        }
    }
}
