//! Interactive terminal presenter
//!
//! Drives a [`PdfViewer`] from crossterm input. Presentation mode maps to the
//! terminal's alternate screen.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use flume::Receiver;

use crate::event_source::{EventSource, InputEvent, columns_to_pixels, translate};
use crate::notification::{NotificationCenter, Toast};
use crate::viewer::{
    DisplayMetrics, FullscreenPlatform, PdfViewer, PlatformError, PresentationMode, SlideshowState,
    ViewerSnapshot, ViewerUpdate,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Fullscreen backed by the terminal alternate screen
#[derive(Debug, Default)]
pub struct TerminalFullscreen {
    active: bool,
}

impl TerminalFullscreen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FullscreenPlatform for TerminalFullscreen {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        execute!(io::stdout(), EnterAlternateScreen).map_err(|e| PlatformError(e.to_string()))?;
        self.active = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        execute!(io::stdout(), LeaveAlternateScreen).map_err(|e| PlatformError(e.to_string()))?;
        self.active = false;
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.active
    }
}

/// One-line description of the viewer state
pub fn status_line(snapshot: &ViewerSnapshot) -> String {
    if let Some(error) = &snapshot.error {
        return format!("Error: {error}");
    }

    let mut line = match snapshot.current_page {
        Some(page) => format!("Page {page} / {}", snapshot.total_pages),
        None if snapshot.loading => "Loading document...".to_string(),
        None => "No document".to_string(),
    };
    if snapshot.current_page.is_some() && snapshot.loading {
        line.push_str("  [rendering]");
    }
    if snapshot.slideshow == SlideshowState::Running {
        line.push_str("  [slideshow]");
    }
    if snapshot.presentation == PresentationMode::Fullscreen {
        line.push_str("  [presentation]");
    }
    line
}

const HELP: &str = "<-/->: page  Home/End: first/last  space: slideshow  f: presentation  Esc: close  q: quit";

/// Run the presenter until the user quits or the viewer asks to close
pub fn run_presenter<W: Write>(
    viewer: &mut PdfViewer,
    source: &mut dyn EventSource,
    out: &mut W,
    toasts: &Receiver<Toast>,
) -> Result<()> {
    let updates = viewer.subscribe();
    let mut notifications = NotificationCenter::new();
    let mut dirty = true;

    loop {
        viewer.pump();

        for update in updates.try_iter() {
            match update {
                ViewerUpdate::CloseRequested => return Ok(()),
                ViewerUpdate::Changed(_) => dirty = true,
            }
        }
        for toast in toasts.try_iter() {
            notifications.show(toast);
            dirty = true;
        }
        dirty |= notifications.update();

        if dirty {
            draw(viewer, &notifications, out)?;
            dirty = false;
        }

        if !source.poll(POLL_INTERVAL)? {
            continue;
        }
        let event = source.read()?;
        match translate(&event) {
            Some(InputEvent::Quit) => return Ok(()),
            Some(InputEvent::Key(key)) => {
                viewer.handle_key(key);
            }
            Some(InputEvent::TouchStart(x)) => viewer.touch_start(x),
            Some(InputEvent::TouchEnd(x)) => {
                viewer.touch_end(x);
            }
            Some(InputEvent::Resize(columns)) => {
                let pixel_ratio = viewer.display().pixel_ratio;
                viewer.set_display(DisplayMetrics::new(columns_to_pixels(columns), pixel_ratio));
                dirty = true;
            }
            None => {}
        }
    }
}

fn draw<W: Write>(viewer: &PdfViewer, notifications: &NotificationCenter, out: &mut W) -> Result<()> {
    let snapshot = viewer.snapshot();
    queue!(
        out,
        MoveTo(0, 0),
        Clear(ClearType::All),
        Print(status_line(&snapshot)),
        MoveTo(0, 1)
    )?;

    if let Some(page) = viewer.displayed_page() {
        queue!(
            out,
            Print(format!(
                "Showing page {} ({}x{} px, {} KiB)",
                page.page,
                page.width,
                page.height,
                page.jpeg.len() / 1024
            ))
        )?;
    }
    if let Some(current) = notifications.current() {
        queue!(
            out,
            MoveTo(0, 3),
            Print(format!(
                "{}: {}",
                current.toast.title, current.toast.description
            ))
        )?;
    }
    queue!(out, MoveTo(0, 5), Print(HELP))?;
    out.flush()?;
    Ok(())
}
