//! MuPDF document backend
//!
//! Documents are resolved once (local path, `file://` or fetched over HTTP)
//! and every render worker opens its own `mupdf::Document` from that source,
//! since MuPDF documents cannot be shared across threads.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::engine::{DocumentBackend, DocumentHandle, Rasterizer};
use super::error::{LoadError, RenderError};
use super::types::Raster;

const PDF_MAGIC: &str = "application/pdf";
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Opens PDFs with MuPDF, fetching remote URLs with a blocking HTTP client
pub struct MupdfBackend {
    http: reqwest::blocking::Client,
}

impl MupdfBackend {
    pub fn new() -> Result<Self, String> {
        let http = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| format!("HTTP client: {e}"))?;
        Ok(Self { http })
    }

    fn resolve(&self, url: &str) -> Result<Source, LoadError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let bytes = self
                .http
                .get(url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status)
                .and_then(reqwest::blocking::Response::bytes)
                .map_err(|e| LoadError::parse(format!("fetch failed: {e}")))?;
            log::debug!("Fetched {} bytes from {url}", bytes.len());
            return Ok(Source::Bytes(Arc::new(bytes.to_vec())));
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(Source::Path(PathBuf::from(path)))
    }
}

impl DocumentBackend for MupdfBackend {
    fn open(&self, url: &str) -> Result<Arc<dyn DocumentHandle>, LoadError> {
        let source = self.resolve(url)?;
        let doc = source.open().map_err(LoadError::Parse)?;
        let page_count = doc
            .page_count()
            .map_err(|e| LoadError::parse(e.to_string()))?;

        Ok(Arc::new(MupdfDocument {
            source,
            page_count: usize::try_from(page_count).unwrap_or(0),
        }))
    }
}

#[derive(Clone)]
enum Source {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

impl Source {
    fn open(&self) -> Result<Document, String> {
        match self {
            Source::Path(path) => {
                Document::open(path.to_string_lossy().as_ref()).map_err(|e| e.to_string())
            }
            Source::Bytes(bytes) => {
                Document::from_bytes(bytes.as_slice(), PDF_MAGIC).map_err(|e| e.to_string())
            }
        }
    }
}

struct MupdfDocument {
    source: Source,
    page_count: usize,
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn rasterizer(&self) -> Result<Box<dyn Rasterizer>, String> {
        let doc = self.source.open()?;
        Ok(Box::new(MupdfRasterizer { doc }))
    }
}

struct MupdfRasterizer {
    doc: Document,
}

impl Rasterizer for MupdfRasterizer {
    fn rasterize(&mut self, page: usize, scale: f32) -> Result<Raster, RenderError> {
        let index = i32::try_from(page.saturating_sub(1))
            .map_err(|_| RenderError::page(page, "page index out of range"))?;
        let loaded = self
            .doc
            .load_page(index)
            .map_err(|e| RenderError::page(page, e.to_string()))?;

        let rgb = Colorspace::device_rgb();
        let pixmap = loaded
            .to_pixmap(&Matrix::new_scale(scale, scale), &rgb, false, false)
            .map_err(|e| RenderError::page(page, e.to_string()))?;

        let pixels = pixmap_to_rgb(&pixmap).map_err(|detail| RenderError::page(page, detail))?;
        Ok(Raster {
            pixels,
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }
}

/// Copy pixmap samples into a tightly packed RGB buffer
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".to_string());
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}
