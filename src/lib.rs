pub mod event_source;
pub mod export;
pub mod notification;
pub mod panic_handler;
pub mod presenter;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use presenter::{TerminalFullscreen, run_presenter};
pub use viewer::{PdfViewer, ViewerConfig};
