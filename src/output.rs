//! CLI output formatting for the export and check commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each page leads with
//! what it is (trip name, post title, journal page) and shows the written
//! file after an arrow. Sections follow the order of the site: fixed pages,
//! trips, journal pages, posts.
//!
//! # Output Format
//!
//! ## Export
//!
//! ```text
//! Pages
//!     Home → index.html
//!     Trips → trips/index.html
//!     Countries → countries/index.html
//!     Map → map/index.html
//!     Not found → 404.html
//!
//! Trips
//!     001 Balkans by Rail → trips/7/index.html
//!     002 South America → trips/4/index.html
//!
//! Journal
//!     001 Page 1 → journal/index.html
//!
//! Posts
//!     001 Cusco → post/184512/index.html
//!
//! Skipped
//!     /post/ghost (not found)
//!     post "../x" (unsafe id)
//!
//! Assets
//!     favicon.ico
//!
//! Exported 9 pages (2 trips, 1 journal page, 1 post) to dist
//! ```
//!
//! ## Check
//!
//! ```text
//! Backend  https://abc.supabase.co/rest/v1/
//! Posts        608
//! Countries     42
//! Trips          9
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::display::format_count;
use crate::export::{ExportManifest, ExportedPage, NOT_FOUND_FILE};
use crate::types::Stats;

const LABEL_MAX: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max).collect();
        format!("{}...", kept.trim_end())
    }
}

fn page_line(label: &str, file: &str) -> String {
    format!("{}{} → {}", indent(1), truncate_label(label, LABEL_MAX), file)
}

fn numbered_section(lines: &mut Vec<String>, heading: &str, pages: &[&ExportedPage]) {
    if pages.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(heading.to_string());
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!(
            "{}{} {} → {}",
            indent(1),
            format_index(i + 1),
            truncate_label(&page.label, LABEL_MAX),
            page.file
        ));
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format the export summary: every written page grouped by kind.
pub fn format_export_output(manifest: &ExportManifest) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for page in manifest.fixed_pages() {
        lines.push(page_line(&page.label, &page.file));
    }
    lines.push(page_line("Not found", NOT_FOUND_FILE));

    let trips: Vec<_> = manifest.trips().collect();
    let journal: Vec<_> = manifest.journal_pages().collect();
    let posts: Vec<_> = manifest.posts().collect();
    numbered_section(&mut lines, "Trips", &trips);
    numbered_section(&mut lines, "Journal", &journal);
    numbered_section(&mut lines, "Posts", &posts);

    if !manifest.skipped.is_empty() || !manifest.rejected.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for route in &manifest.skipped {
            lines.push(format!("{}{} (not found)", indent(1), route.path()));
        }
        for id in &manifest.rejected {
            lines.push(format!("{}post {:?} (unsafe id)", indent(1), id));
        }
    }

    if !manifest.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &manifest.assets {
            lines.push(format!("{}{}", indent(1), asset));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Exported {} ({}, {}, {}) to {}",
        plural(manifest.pages.len() + 1, "page", "pages"),
        plural(trips.len(), "trip", "trips"),
        plural(journal.len(), "journal page", "journal pages"),
        plural(posts.len(), "post", "posts"),
        manifest.output_dir.display()
    ));
    lines
}

pub fn print_export_output(manifest: &ExportManifest) {
    for line in format_export_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the backend check: where the data came from and the three counters.
pub fn format_check_output(source: &str, stats: &Stats) -> Vec<String> {
    let rows = [
        ("Posts", stats.posts),
        ("Countries", stats.countries),
        ("Trips", stats.trips),
    ];
    let width = rows
        .iter()
        .map(|(_, n)| format_count(*n).len())
        .max()
        .unwrap_or(1);
    let mut lines = vec![format!("{:<9} {}", "Backend", source)];
    for (label, n) in rows {
        lines.push(format!("{:<9} {:>width$}", label, format_count(n)));
    }
    lines
}

pub fn print_check_output(source: &str, stats: &Stats) {
    for line in format_check_output(source, stats) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::Route;
    use std::path::PathBuf;

    fn page(route: Route, label: &str) -> ExportedPage {
        ExportedPage {
            file: route.output_file(),
            route,
            label: label.to_string(),
        }
    }

    fn sample_manifest() -> ExportManifest {
        ExportManifest {
            output_dir: PathBuf::from("dist"),
            pages: vec![
                page(Route::Home, "Home"),
                page(Route::Trips, "Trips"),
                page(Route::Trip(7), "Balkans by Rail"),
                page(Route::Trip(4), "South America"),
                page(Route::Journal(1), "Page 1"),
                page(Route::Post("184512".into()), "Cusco"),
            ],
            skipped: vec![],
            rejected: vec![],
            assets: vec![],
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn truncate_label_counts_characters() {
        assert_eq!(truncate_label("Cusco", 10), "Cusco");
        assert_eq!(truncate_label("Día de los Muertos", 3), "Día...");
        assert_eq!(truncate_label("two words", 4), "two...");
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn export_output_groups_sections() {
        let lines = format_export_output(&sample_manifest());
        assert_eq!(lines[0], "Pages");
        assert_eq!(lines[1], "    Home → index.html");
        assert_eq!(lines[2], "    Trips → trips/index.html");
        assert_eq!(lines[3], "    Not found → 404.html");
        assert!(lines.contains(&"    001 Balkans by Rail → trips/7/index.html".to_string()));
        assert!(lines.contains(&"    002 South America → trips/4/index.html".to_string()));
        assert!(lines.contains(&"    001 Cusco → post/184512/index.html".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Exported 7 pages (2 trips, 1 journal page, 1 post) to dist"
        );
    }

    #[test]
    fn export_output_lists_skipped_and_assets() {
        let mut manifest = sample_manifest();
        manifest.skipped.push(Route::Post("ghost".into()));
        manifest.assets.push("img/logo.svg".into());
        manifest.rejected.push("../x".into());
        let lines = format_export_output(&manifest);
        assert!(lines.contains(&"    post \"../x\" (unsafe id)".to_string()));
        assert!(lines.contains(&"Skipped".to_string()));
        assert!(lines.contains(&"    /post/ghost (not found)".to_string()));
        assert!(lines.contains(&"    img/logo.svg".to_string()));
    }

    #[test]
    fn export_output_omits_empty_sections() {
        let manifest = ExportManifest {
            output_dir: PathBuf::from("out"),
            pages: vec![page(Route::Home, "Home")],
            ..Default::default()
        };
        let lines = format_export_output(&manifest);
        assert!(!lines.contains(&"Trips".to_string()));
        assert!(!lines.contains(&"Posts".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Exported 2 pages (0 trips, 0 journal pages, 0 posts) to out"
        );
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_aligns_counts() {
        let stats = Stats {
            posts: 1608,
            countries: 42,
            trips: 9,
        };
        let lines = format_check_output("fixtures/snapshot.json", &stats);
        assert_eq!(
            lines,
            vec![
                "Backend   fixtures/snapshot.json",
                "Posts     1,608",
                "Countries    42",
                "Trips         9",
            ]
        );
    }
}
