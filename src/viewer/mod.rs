//! PDF page viewer: render cache, prefetch, slideshow and presentation mode

use std::time::Duration;

mod cache;
mod controller;
mod engine;
mod error;
mod event;
mod input;
mod loader;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod navigation;
mod presentation;
mod request;
mod scale;
mod service;
mod slideshow;
mod types;
mod worker;

pub use cache::RenderCache;
pub use controller::{PdfViewer, ViewerConfig};
pub use engine::{DocumentBackend, DocumentHandle, Engine, EngineState, Rasterizer};
pub use error::{LoadError, PlatformError, RenderError};
pub use event::{ViewerEvent, ViewerSnapshot, ViewerUpdate};
pub use input::{Key, KeyOutcome, SwipeTracker, ViewerCommand, route_key};
#[cfg(feature = "pdf")]
pub use mupdf_backend::MupdfBackend;
pub use navigation::{NavCommand, NavEffect, Navigator};
pub use presentation::{FullscreenPlatform, Presentation, PresentationMode};
pub use request::{RenderRequest, RenderResponse, RequestId};
pub use scale::DisplayMetrics;
pub use service::{RenderConfig, RenderOutcome, RenderService};
pub use slideshow::{Slideshow, SlideshowState, SlideshowTick, TickAction, TickerId};
pub use types::{DocumentId, Raster, RenderedPage};
pub use worker::{encode_jpeg, render_page};

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_PREFETCH_RADIUS: usize = 1;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SLIDESHOW_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 50.0;
pub const DEFAULT_MAX_RENDER_SCALE: f32 = 6.0;
