//! Error types for document loading, page rendering and platform calls

/// Failure to open a document. Terminal for the load attempt.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("no document URL was provided")]
    InvalidInput,

    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("could not open document: {0}")]
    Parse(String),
}

impl LoadError {
    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse(detail.into())
    }
}

/// Failure to produce a single page. Recoverable; the page stays uncached.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },

    #[error("page {page}: image encoding failed: {detail}")]
    Encode { page: usize, detail: String },

    #[error("page {page}: render timed out")]
    Timeout { page: usize },
}

impl RenderError {
    pub fn page(page: usize, detail: impl Into<String>) -> Self {
        Self::Page {
            page,
            detail: detail.into(),
        }
    }

    /// Page number the error refers to
    #[must_use]
    pub fn page_number(&self) -> usize {
        match self {
            Self::Page { page, .. } | Self::Encode { page, .. } | Self::Timeout { page } => *page,
        }
    }
}

/// Fullscreen request rejected by the platform
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("fullscreen request failed: {0}")]
pub struct PlatformError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_reports_page() {
        assert_eq!(RenderError::page(3, "boom").page_number(), 3);
        assert_eq!(RenderError::Timeout { page: 7 }.page_number(), 7);
        assert_eq!(
            RenderError::Timeout { page: 7 }.to_string(),
            "page 7: render timed out"
        );
    }

    #[test]
    fn invalid_input_message() {
        assert_eq!(
            LoadError::InvalidInput.to_string(),
            "no document URL was provided"
        );
    }
}
