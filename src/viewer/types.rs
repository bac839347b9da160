//! Core types for page rendering

/// Generation number of a document load.
///
/// Every call to `load` gets a fresh id; results tagged with an older id
/// belong to a superseded document and are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Raw rasterized page before encoding.
///
/// Contains RGB pixel data (3 bytes per pixel, no row padding).
#[derive(Clone)]
pub struct Raster {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Encoded page image ready for display
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Page number (1-based)
    pub page: usize,
    pub width: u32,
    pub height: u32,
    /// Scale in thousandths, the value the page was rasterized at
    pub scale_milli: u32,
    /// JPEG bytes
    pub jpeg: Vec<u8>,
}

impl RenderedPage {
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale_milli as f32 / 1000.0
    }
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("page", &self.page)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale())
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}
