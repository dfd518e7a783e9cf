//! # Travelog
//!
//! Server-rendered pages for a personal travel journal. Trips, countries and
//! posts live in a hosted Postgres database exposed over PostgREST; this crate
//! reads pre-aggregated rows from its views and renders them as styled HTML.
//!
//! # Architecture: Fetch → Render
//!
//! ```text
//! request path ─▶ Route ─▶ queries (try_join!) ─▶ pages::* ─▶ HTML
//!                              │
//!                              ▼
//!                        dyn Backend
//!                  (PostgREST or JSON snapshot)
//! ```
//!
//! All aggregation (post counts, trip/country joins, the timeline) happens in
//! the database views `timeline`, `trips_with_countries`,
//! `countries_with_stats` and `posts_with_thumbnail`. The application code
//! fetches, decodes into typed rows and binds them to templates.
//!
//! The same render path backs two front ends:
//!
//! - **serve**: an actix-web server with a per-route revalidation cache, so
//!   a page is rendered at most once per window.
//! - **export**: every route written to disk as a static site.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`backend`] | The `Backend` trait, request descriptors, PostgREST client and JSON snapshot |
//! | [`queries`] | One typed accessor per page data need |
//! | [`types`] | Row types for tables and views |
//! | [`blocks`] | NPF content blocks, layout rows and EXIF |
//! | [`dates`] | Lenient date/timestamp column parsing |
//! | [`display`] | Date ranges, flags, counts and other derived display strings |
//! | [`image_loader`] | Image URL rewriting for the resizing edge |
//! | [`pages`] | Routes, the render dispatcher and the Maud page templates |
//! | [`cache`] | Rendered-page cache with ETags and a revalidation window |
//! | [`serve`] | HTTP server |
//! | [`export`] | Static site export |
//! | [`config`] | `travelog.toml` loading, validation, merging, CSS generation, credentials |
//! | [`output`] | CLI output formatting for export and check |
//!
//! # Design Decisions
//!
//! ## Backend as a Trait Object
//!
//! Queries take `&dyn Backend`. The PostgREST client is built once at startup
//! from `SUPABASE_URL` / `SUPABASE_ANON_KEY` and passed down; there is no
//! global client. The snapshot backend answers the same descriptors from a
//! JSON file, which is what the tests and `--snapshot` runs use.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): templates are Rust
//! code checked at compile time, and every interpolation is escaped. Post
//! bodies are NPF blocks rendered element by element, never raw HTML.
//!
//! ## Synchronous Revalidation
//!
//! An expired cache entry is re-rendered by the request that finds it, not in
//! the background. Concurrent misses may render twice. When a re-render fails
//! the stale copy is served rather than an error page.

pub mod backend;
pub mod blocks;
pub mod cache;
pub mod config;
pub mod dates;
pub mod display;
pub mod export;
pub mod image_loader;
pub mod output;
pub mod pages;
pub mod queries;
pub mod serve;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
