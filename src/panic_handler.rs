//! Terminal state around the presenter, restored on exit and on panic

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io::{self, Write};
use std::panic;

/// Install better-panic and a hook that puts the terminal back before the
/// report is printed. Render and loader threads panic into the same hook.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        let thread = std::thread::current();
        log::error!(
            "Panic on thread {}: {panic_info}",
            thread.name().unwrap_or("<unnamed>")
        );
        default_hook(panic_info);
        std::process::exit(1);
    }));
}

/// Raw mode, mouse capture (for swipes) and a hidden cursor for the lifetime
/// of the value
#[derive(Debug)]
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn start() -> io::Result<Self> {
        enable_raw_mode()?;
        let session = Self { _private: () };
        execute!(io::stdout(), EnableMouseCapture, Hide)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Undo everything `TerminalSession` and presentation mode may have changed.
/// Safe to call more than once.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show);
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_is_repeatable_without_a_session() {
        restore_terminal();
        restore_terminal();
    }
}
