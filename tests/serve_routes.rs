//! HTTP-level tests for serve mode: statuses, headers, ETag revalidation,
//! the stale-copy fallback and asset serving.
//!
//! Requests go through `actix_web::test::init_service` with the same
//! `serve::configure` the binary uses, against the sample snapshot.

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use travelog::backend::{Backend, BackendError, Count, Select, SnapshotBackend};
use travelog::config::SiteConfig;
use travelog::serve::{self, AppState};

fn sample_backend() -> SnapshotBackend {
    SnapshotBackend::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/snapshot.json"))
        .unwrap()
}

/// Snapshot backend that can be switched into failing every request.
struct SwitchableBackend {
    inner: SnapshotBackend,
    failing: AtomicBool,
}

impl SwitchableBackend {
    fn new() -> Self {
        Self {
            inner: sample_backend(),
            failing: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(BackendError::Status {
                relation: "any".into(),
                status: 503,
                body: "maintenance".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for SwitchableBackend {
    async fn select(&self, query: &Select) -> Result<Vec<serde_json::Value>, BackendError> {
        self.check()?;
        self.inner.select(query).await
    }

    async fn count(&self, query: &Count) -> Result<u64, BackendError> {
        self.check()?;
        self.inner.count(query).await
    }
}

fn state_with(backend: Arc<dyn Backend>, config: SiteConfig) -> web::Data<AppState> {
    web::Data::new(AppState::new(backend, config))
}

fn sample_state() -> web::Data<AppState> {
    state_with(Arc::new(sample_backend()), SiteConfig::default())
}

fn header_str(resp: &actix_web::dev::ServiceResponse, name: header::HeaderName) -> String {
    resp.headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header"))
        .to_str()
        .unwrap()
        .to_string()
}

// =========================================================================
// Pages
// =========================================================================

#[actix_web::test]
async fn home_is_html_with_cache_headers() {
    let app = test::init_service(App::new().app_data(sample_state()).configure(serve::configure)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "text/html; charset=utf-8");
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), "public, max-age=60");
    let etag = header_str(&resp, header::ETAG);
    assert!(etag.starts_with('"'));

    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).unwrap();
    assert!(html.contains("Recent Posts"));
}

#[actix_web::test]
async fn every_route_renders() {
    let app = test::init_service(App::new().app_data(sample_state()).configure(serve::configure)).await;
    for uri in [
        "/",
        "/trips",
        "/trips/4",
        "/trips/9/",
        "/countries",
        "/map",
        "/journal",
        "/post/184512",
        "/post/210001/index.html",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn matching_etag_gets_304() {
    let app = test::init_service(App::new().app_data(sample_state()).configure(serve::configure)).await;
    let first =
        test::call_service(&app, test::TestRequest::get().uri("/trips").to_request()).await;
    let etag = header_str(&first, header::ETAG);

    let req = test::TestRequest::get()
        .uri("/trips/")
        .insert_header((header::IF_NONE_MATCH, etag.clone()))
        .to_request();
    let second = test::call_service(&app, req).await;
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header_str(&second, header::ETAG), etag);

    let req = test::TestRequest::get()
        .uri("/trips")
        .insert_header((header::IF_NONE_MATCH, "\"something-else\""))
        .to_request();
    let third = test::call_service(&app, req).await;
    assert_eq!(third.status(), StatusCode::OK);
}

#[actix_web::test]
async fn misses_are_404() {
    let app = test::init_service(App::new().app_data(sample_state()).configure(serve::configure)).await;
    for uri in [
        "/about",
        "/trips/999",
        "/trips/abc",
        "/post/nope",
        "/journal/page/9",
        "/journal/page/18446744073709551615",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("Not found"), "{uri}");
    }
}

#[actix_web::test]
async fn only_get_and_head_are_allowed() {
    let app = test::init_service(App::new().app_data(sample_state()).configure(serve::configure)).await;
    let resp = test::call_service(&app, test::TestRequest::post().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(header_str(&resp, header::ALLOW), "GET, HEAD");
}

// =========================================================================
// Backend failures and the cache
// =========================================================================

#[actix_web::test]
async fn backend_failure_is_502() {
    let state = state_with(Arc::new(SnapshotBackend::default()), SiteConfig::default());
    let app = test::init_service(App::new().app_data(state).configure(serve::configure)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Journal unavailable"));
}

#[actix_web::test]
async fn cached_page_survives_backend_outage() {
    let backend = Arc::new(SwitchableBackend::new());
    let state = state_with(backend.clone(), SiteConfig::default());
    let app = test::init_service(App::new().app_data(state.clone()).configure(serve::configure)).await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/map").to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    backend.failing.store(true, Ordering::SeqCst);
    let second = test::call_service(&app, test::TestRequest::get().uri("/map").to_request()).await;
    assert_eq!(second.status(), StatusCode::OK);

    let uncached =
        test::call_service(&app, test::TestRequest::get().uri("/countries").to_request()).await;
    assert_eq!(uncached.status(), StatusCode::BAD_GATEWAY);

    let stats = state.cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[actix_web::test]
async fn stale_copy_served_when_rerender_fails() {
    let backend = Arc::new(SwitchableBackend::new());
    let mut config = SiteConfig::default();
    config.cache.revalidate_secs = 0;
    let state = state_with(backend.clone(), config);
    let app = test::init_service(App::new().app_data(state.clone()).configure(serve::configure)).await;

    let first = test::call_service(&app, test::TestRequest::get().uri("/trips").to_request()).await;
    let etag = header_str(&first, header::ETAG);
    assert_eq!(header_str(&first, header::CACHE_CONTROL), "public, max-age=0");

    backend.failing.store(true, Ordering::SeqCst);
    let second =
        test::call_service(&app, test::TestRequest::get().uri("/trips").to_request()).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header_str(&second, header::ETAG), etag);
    assert_eq!(state.cache.stats().refreshes, 1);
}

// =========================================================================
// Assets
// =========================================================================

#[actix_web::test]
async fn assets_are_served_from_the_assets_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("img")).unwrap();
    std::fs::write(tmp.path().join("img/logo.svg"), "<svg/>").unwrap();
    std::fs::write(tmp.path().join("site.css"), "body{}").unwrap();

    let mut config = SiteConfig::default();
    config.server.assets_dir = tmp.path().to_string_lossy().into_owned();
    let state = state_with(Arc::new(sample_backend()), config);
    let app = test::init_service(App::new().app_data(state).configure(serve::configure)).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/assets/img/logo.svg").to_request())
            .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "image/svg+xml");
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"<svg/>");

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/assets/site.css").to_request())
            .await;
    assert_eq!(header_str(&resp, header::CONTENT_TYPE), "text/css; charset=utf-8");

    for uri in ["/assets/missing.png", "/assets/%2e%2e/secret.toml", "/assets/img"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
