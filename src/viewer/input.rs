//! Keyboard and swipe bindings

use super::presentation::PresentationMode;

/// Platform-neutral key identity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Home,
    End,
    Space,
    Escape,
    Char(char),
    Other,
}

/// Commands the viewer understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerCommand {
    Next,
    Previous,
    First,
    Last,
    GoTo(usize),
    TogglePresentation,
    ExitPresentation,
    ToggleSlideshow,
    Close,
}

/// Result of routing a key press
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    pub command: Option<ViewerCommand>,
    /// The host should suppress the key's default action (page scroll)
    pub prevent_default: bool,
}

impl KeyOutcome {
    const fn command(cmd: ViewerCommand) -> Self {
        Self {
            command: Some(cmd),
            prevent_default: false,
        }
    }
}

/// Map a key press to a viewer command
#[must_use]
pub fn route_key(key: Key, mode: PresentationMode) -> KeyOutcome {
    match key {
        Key::Left => KeyOutcome::command(ViewerCommand::Previous),
        Key::Right => KeyOutcome::command(ViewerCommand::Next),
        Key::Home => KeyOutcome::command(ViewerCommand::First),
        Key::End => KeyOutcome::command(ViewerCommand::Last),
        Key::Char('f' | 'F') => KeyOutcome::command(ViewerCommand::TogglePresentation),
        Key::Space | Key::Char(' ') => KeyOutcome {
            command: Some(ViewerCommand::ToggleSlideshow),
            prevent_default: true,
        },
        Key::Escape => match mode {
            PresentationMode::Fullscreen => KeyOutcome::command(ViewerCommand::ExitPresentation),
            PresentationMode::Windowed => KeyOutcome::command(ViewerCommand::Close),
        },
        Key::Char(_) | Key::Other => KeyOutcome::default(),
    }
}

/// Horizontal swipe detector
#[derive(Clone, Debug)]
pub struct SwipeTracker {
    threshold: f32,
    start_x: Option<f32>,
}

impl SwipeTracker {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.abs(),
            start_x: None,
        }
    }

    pub fn touch_start(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    /// Finish a gesture. Swiping right goes back, swiping left goes forward.
    pub fn touch_end(&mut self, x: f32) -> Option<ViewerCommand> {
        let start = self.start_x.take()?;
        let delta = x - start;
        if delta > self.threshold {
            Some(ViewerCommand::Previous)
        } else if delta < -self.threshold {
            Some(ViewerCommand::Next)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_navigate() {
        let mode = PresentationMode::Windowed;
        assert_eq!(
            route_key(Key::Left, mode).command,
            Some(ViewerCommand::Previous)
        );
        assert_eq!(route_key(Key::Right, mode).command, Some(ViewerCommand::Next));
    }

    #[test]
    fn f_toggles_presentation_in_either_case() {
        let mode = PresentationMode::Windowed;
        for c in ['f', 'F'] {
            assert_eq!(
                route_key(Key::Char(c), mode).command,
                Some(ViewerCommand::TogglePresentation)
            );
        }
    }

    #[test]
    fn space_toggles_slideshow_and_prevents_default() {
        let outcome = route_key(Key::Space, PresentationMode::Windowed);
        assert_eq!(outcome.command, Some(ViewerCommand::ToggleSlideshow));
        assert!(outcome.prevent_default);
    }

    #[test]
    fn escape_depends_on_mode() {
        assert_eq!(
            route_key(Key::Escape, PresentationMode::Fullscreen).command,
            Some(ViewerCommand::ExitPresentation)
        );
        assert_eq!(
            route_key(Key::Escape, PresentationMode::Windowed).command,
            Some(ViewerCommand::Close)
        );
    }

    #[test]
    fn unbound_keys_do_nothing() {
        assert_eq!(
            route_key(Key::Char('x'), PresentationMode::Windowed),
            KeyOutcome::default()
        );
    }

    #[test]
    fn swipe_left_goes_forward() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(300.0);
        assert_eq!(swipe.touch_end(200.0), Some(ViewerCommand::Next));
    }

    #[test]
    fn swipe_right_goes_back() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(300.0), Some(ViewerCommand::Previous));
    }

    #[test]
    fn short_drags_are_not_swipes() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(220.0), None);

        // Exactly on the threshold is still not a swipe
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(150.0), None);
    }

    #[test]
    fn touch_end_without_start_is_ignored() {
        let mut swipe = SwipeTracker::new(50.0);
        assert_eq!(swipe.touch_end(0.0), None);

        swipe.touch_start(300.0);
        swipe.cancel();
        assert_eq!(swipe.touch_end(0.0), None);
    }
}
