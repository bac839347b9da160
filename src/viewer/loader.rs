//! Background document loading

use std::sync::Arc;

use flume::Sender;

use super::engine::DocumentBackend;
use super::error::LoadError;
use super::event::ViewerEvent;
use super::types::DocumentId;

/// Reject empty and whitespace-only URLs
pub fn validate_url(url: &str) -> Result<&str, LoadError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        Err(LoadError::InvalidInput)
    } else {
        Ok(trimmed)
    }
}

/// Open `url` on a loader thread and post the result tagged with `doc`.
///
/// Nothing here cancels an older load; the viewer drops results whose `doc`
/// is no longer current.
pub fn spawn_load(
    backend: Arc<dyn DocumentBackend>,
    doc: DocumentId,
    url: String,
    events: Sender<ViewerEvent>,
) {
    let fallback = events.clone();
    let spawned = std::thread::Builder::new()
        .name(format!("folio-load-{}", doc.0))
        .spawn(move || {
            log::info!("Opening document {url}");
            let event = match backend.open(&url) {
                Ok(handle) => {
                    log::info!("Opened {url}: {} pages", handle.page_count());
                    ViewerEvent::Loaded { doc, handle }
                }
                Err(error) => {
                    log::error!("Failed to open {url}: {error}");
                    ViewerEvent::LoadFailed { doc, error }
                }
            };
            let _ = events.send(event);
        });

    if let Err(e) = spawned {
        let _ = fallback.send(ViewerEvent::LoadFailed {
            doc,
            error: LoadError::parse(format!("could not start loader: {e}")),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_urls_are_invalid() {
        assert_eq!(validate_url(""), Err(LoadError::InvalidInput));
        assert_eq!(validate_url("   \t"), Err(LoadError::InvalidInput));
        assert_eq!(validate_url(" doc.pdf "), Ok("doc.pdf"));
    }
}
