//! Render request and response types

use std::sync::Arc;

use super::error::RenderError;
use super::types::{DocumentId, RenderedPage};

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to render workers
#[derive(Debug)]
pub enum RenderRequest {
    /// Rasterize and encode a page
    Page {
        id: RequestId,
        doc: DocumentId,
        page: usize,
        scale: f32,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from render workers
#[derive(Debug)]
pub enum RenderResponse {
    /// Encoded page data
    Page {
        id: RequestId,
        doc: DocumentId,
        data: Arc<RenderedPage>,
    },

    /// Error during rendering
    Error {
        id: RequestId,
        doc: DocumentId,
        error: RenderError,
    },
}

impl RenderResponse {
    #[must_use]
    pub fn document(&self) -> DocumentId {
        match self {
            Self::Page { doc, .. } | Self::Error { doc, .. } => *doc,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Page { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}
