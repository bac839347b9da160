//! Presentation (fullscreen) mode

use super::error::PlatformError;

/// Platform fullscreen capability.
///
/// Implementations that can leave fullscreen on their own (a system key, a
/// window manager) should post `ViewerEvent::FullscreenChanged` so the viewer
/// can resynchronise.
pub trait FullscreenPlatform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError>;
    fn exit_fullscreen(&mut self) -> Result<(), PlatformError>;
    /// Whether the viewer currently owns the fullscreen surface
    fn is_fullscreen(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PresentationMode {
    #[default]
    Windowed,
    Fullscreen,
}

/// Windowed / Fullscreen state machine over a platform
pub struct Presentation {
    mode: PresentationMode,
    platform: Box<dyn FullscreenPlatform>,
}

impl Presentation {
    #[must_use]
    pub fn new(platform: Box<dyn FullscreenPlatform>) -> Self {
        Self {
            mode: PresentationMode::Windowed,
            platform,
        }
    }

    #[must_use]
    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.mode == PresentationMode::Fullscreen
    }

    pub fn enter(&mut self) -> Result<(), PlatformError> {
        self.platform.request_fullscreen()?;
        self.mode = PresentationMode::Fullscreen;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<(), PlatformError> {
        self.platform.exit_fullscreen()?;
        self.mode = PresentationMode::Windowed;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), PlatformError> {
        match self.mode {
            PresentationMode::Windowed => self.enter(),
            PresentationMode::Fullscreen => self.exit(),
        }
    }

    /// Resync after the platform reported a fullscreen change.
    ///
    /// Returns true when the platform is no longer fullscreen, in which case
    /// the caller must stop the slideshow.
    pub fn on_fullscreen_changed(&mut self) -> bool {
        if self.platform.is_fullscreen() {
            self.mode = PresentationMode::Fullscreen;
            false
        } else {
            self.mode = PresentationMode::Windowed;
            true
        }
    }
}

impl std::fmt::Debug for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presentation")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeFullscreen;

    #[test]
    fn toggle_enters_and_exits() {
        let platform = FakeFullscreen::new();
        let mut presentation = Presentation::new(Box::new(platform.clone()));

        presentation.toggle().expect("enter");
        assert_eq!(presentation.mode(), PresentationMode::Fullscreen);
        assert!(platform.is_fullscreen());

        presentation.toggle().expect("exit");
        assert_eq!(presentation.mode(), PresentationMode::Windowed);
        assert!(!platform.is_fullscreen());
    }

    #[test]
    fn rejected_request_keeps_windowed() {
        let platform = FakeFullscreen::new();
        platform.reject_requests(true);
        let mut presentation = Presentation::new(Box::new(platform));

        assert!(presentation.enter().is_err());
        assert_eq!(presentation.mode(), PresentationMode::Windowed);
    }

    #[test]
    fn external_exit_forces_windowed() {
        let platform = FakeFullscreen::new();
        let mut presentation = Presentation::new(Box::new(platform.clone()));
        presentation.enter().expect("enter");

        platform.leave_externally();
        assert!(presentation.on_fullscreen_changed());
        assert_eq!(presentation.mode(), PresentationMode::Windowed);
    }

    #[test]
    fn change_while_still_fullscreen_syncs_up() {
        let platform = FakeFullscreen::new();
        let mut presentation = Presentation::new(Box::new(platform.clone()));

        platform.enter_externally();
        assert!(!presentation.on_fullscreen_changed());
        assert!(presentation.is_fullscreen());
    }
}
