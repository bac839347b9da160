//! Messages flowing into and out of the viewer

use std::sync::Arc;

use super::engine::DocumentHandle;
use super::error::LoadError;
use super::presentation::PresentationMode;
use super::request::RenderResponse;
use super::slideshow::{SlideshowState, SlideshowTick};
use super::types::DocumentId;

/// Everything that can wake the viewer up: loader results, worker results,
/// timer ticks and platform notifications all arrive on one channel.
pub enum ViewerEvent {
    Loaded {
        doc: DocumentId,
        handle: Arc<dyn DocumentHandle>,
    },
    LoadFailed {
        doc: DocumentId,
        error: LoadError,
    },
    Render(RenderResponse),
    SlideshowTick(SlideshowTick),
    /// The platform's fullscreen surface changed; query it for the new state
    FullscreenChanged,
}

impl From<RenderResponse> for ViewerEvent {
    fn from(response: RenderResponse) -> Self {
        Self::Render(response)
    }
}

impl From<SlideshowTick> for ViewerEvent {
    fn from(tick: SlideshowTick) -> Self {
        Self::SlideshowTick(tick)
    }
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded { doc, handle } => f
                .debug_struct("Loaded")
                .field("doc", doc)
                .field("page_count", &handle.page_count())
                .finish(),
            Self::LoadFailed { doc, error } => f
                .debug_struct("LoadFailed")
                .field("doc", doc)
                .field("error", error)
                .finish(),
            Self::Render(response) => f.debug_tuple("Render").field(response).finish(),
            Self::SlideshowTick(tick) => f.debug_tuple("SlideshowTick").field(tick).finish(),
            Self::FullscreenChanged => f.write_str("FullscreenChanged"),
        }
    }
}

/// Read-only view of the viewer state for the UI layer
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ViewerSnapshot {
    /// 1-based current page, `None` before a document is loaded
    pub current_page: Option<usize>,
    pub total_pages: usize,
    /// Page whose image is on screen; may lag `current_page` while loading
    pub displayed_page: Option<usize>,
    /// A document or the current page is being produced
    pub loading: bool,
    pub error: Option<String>,
    pub presentation: PresentationMode,
    pub slideshow: SlideshowState,
}

/// Notifications published to subscribers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerUpdate {
    Changed(ViewerSnapshot),
    CloseRequested,
}
