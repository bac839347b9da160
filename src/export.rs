//! Headless page export: render pages through a viewer and write the JPEGs
//! to a directory.

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::viewer::PdfViewer;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("export directory {0:?} not found")]
    ExportDirNotFound(PathBuf),
    #[error("document did not finish loading")]
    LoadTimedOut,
    #[error("document failed to load: {0}")]
    LoadFailed(String),
    #[error("invalid page range {0:?}, expected N or A-B")]
    InvalidRange(String),
}

/// Parse `N` or `A-B` (1-based, inclusive)
pub fn parse_page_range(text: &str) -> Result<RangeInclusive<usize>, ExportError> {
    let invalid = || ExportError::InvalidRange(text.to_string());
    let (start, end) = match text.split_once('-') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (text.trim(), text.trim()),
    };
    let start: usize = start.parse().map_err(|_| invalid())?;
    let end: usize = end.parse().map_err(|_| invalid())?;
    if start == 0 || end < start {
        return Err(invalid());
    }
    Ok(start..=end)
}

pub fn page_file_name(page: usize) -> String {
    format!("page-{page:04}.jpg")
}

/// Load `url` into `viewer` and write each page of `pages` (clamped to the
/// document) into `out_dir`. Pages that fail to render are skipped.
pub fn export_pages(
    viewer: &mut PdfViewer,
    url: &str,
    out_dir: &Path,
    pages: Option<RangeInclusive<usize>>,
    timeout: Duration,
) -> Result<Vec<PathBuf>> {
    if !out_dir.is_dir() {
        return Err(ExportError::ExportDirNotFound(out_dir.to_path_buf()).into());
    }

    viewer.load(url)?;
    if !viewer.run_until(timeout, |v| !v.is_busy() || v.current_page().is_some()) {
        return Err(ExportError::LoadTimedOut.into());
    }
    if let Some(error) = viewer.error() {
        return Err(ExportError::LoadFailed(error.to_string()).into());
    }

    let total = viewer.total_pages();
    let range = pages.unwrap_or(1..=total.max(1));
    let last = (*range.end()).min(total);
    info!("Exporting pages {}..={last} of {total} to {out_dir:?}", range.start());

    let mut written = Vec::new();
    for page in *range.start()..=last {
        viewer.go_to(page);
        viewer.run_until(timeout, |v| {
            v.cached_page(page).is_some() || !v.in_flight_pages().contains(&page)
        });

        let Some(rendered) = viewer.cached_page(page) else {
            warn!("Skipping page {page}: no image was produced");
            continue;
        };
        let path = out_dir.join(page_file_name(page));
        fs::write(&path, &rendered.jpeg).with_context(|| format!("writing {path:?}"))?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeBackend, TEST_TIMEOUT, TestViewer};

    #[test]
    fn page_ranges() {
        assert_eq!(parse_page_range("3"), Ok(3..=3));
        assert_eq!(parse_page_range("2-5"), Ok(2..=5));
        assert_eq!(parse_page_range(" 2 - 5 "), Ok(2..=5));
        assert!(parse_page_range("0-2").is_err());
        assert!(parse_page_range("5-2").is_err());
        assert!(parse_page_range("x").is_err());
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(page_file_name(7), "page-0007.jpg");
        assert_eq!(page_file_name(1234), "page-1234.jpg");
    }

    #[test]
    fn exports_requested_pages_and_skips_failures() {
        let backend = FakeBackend::new();
        backend.add_document("deck.pdf", 4);
        backend.fail_page("deck.pdf", 3);
        let mut t = TestViewer::new(&backend);
        let dir = tempfile::tempdir().expect("tempdir");

        let written = export_pages(
            &mut t.viewer,
            "deck.pdf",
            dir.path(),
            Some(2..=9),
            TEST_TIMEOUT,
        )
        .expect("export");

        let names: Vec<_> = written
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["page-0002.jpg", "page-0004.jpg"]);

        let bytes = fs::read(&written[0]).expect("read");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let backend = FakeBackend::new();
        backend.add_document("deck.pdf", 1);
        let mut t = TestViewer::new(&backend);
        let dir = tempfile::tempdir().expect("tempdir");

        let err = export_pages(
            &mut t.viewer,
            "deck.pdf",
            &dir.path().join("missing"),
            None,
            TEST_TIMEOUT,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn unreadable_document_is_an_error() {
        let backend = FakeBackend::new();
        let mut t = TestViewer::new(&backend);
        let dir = tempfile::tempdir().expect("tempdir");

        let err = export_pages(&mut t.viewer, "nope.pdf", dir.path(), None, TEST_TIMEOUT)
            .unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
