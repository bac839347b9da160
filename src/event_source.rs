use anyhow::Result;
pub use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

use crate::viewer::Key;

/// Approximate terminal cell width, used to turn mouse drags into swipe pixels
pub const CELL_WIDTH_PX: f32 = 9.0;

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Real keyboard event source using crossterm
pub struct KeyboardEventSource;

impl EventSource for KeyboardEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Terminal input as the presenter understands it
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Key(Key),
    TouchStart(f32),
    TouchEnd(f32),
    /// Terminal resized to this many columns
    Resize(u16),
    Quit,
}

/// Translate a crossterm event. Key releases and unrelated events map to `None`.
pub fn translate(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            if key.code == KeyCode::Char('q')
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
            {
                return Some(InputEvent::Quit);
            }
            let mapped = match key.code {
                KeyCode::Left => Key::Left,
                KeyCode::Right => Key::Right,
                KeyCode::Home => Key::Home,
                KeyCode::End => Key::End,
                KeyCode::Esc => Key::Escape,
                KeyCode::Char(' ') => Key::Space,
                KeyCode::Char(c) => Key::Char(c),
                _ => Key::Other,
            };
            Some(InputEvent::Key(mapped))
        }
        Event::Mouse(mouse) => {
            let x = f32::from(mouse.column) * CELL_WIDTH_PX;
            match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::TouchStart(x)),
                MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::TouchEnd(x)),
                _ => None,
            }
        }
        Event::Resize(columns, _) => Some(InputEvent::Resize(*columns)),
        _ => None,
    }
}

/// Viewport width in pixels of a terminal `columns` wide
pub fn columns_to_pixels(columns: u16) -> u32 {
    (f32::from(columns) * CELL_WIDTH_PX) as u32
}

/// Simulated event source for testing
pub struct SimulatedEventSource {
    pub(crate) events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    /// Helper method to create a key event
    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    /// Helper method to create a simple key event
    pub fn key(code: KeyCode) -> Event {
        Self::key_event(code, KeyModifiers::empty())
    }

    /// Helper method to create a simple character key event
    pub fn char_key(c: char) -> Event {
        Self::key(KeyCode::Char(c))
    }

    /// Left mouse button pressed or released at a column
    pub fn mouse(kind: MouseEventKind, column: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row: 0,
            modifiers: KeyModifiers::empty(),
        })
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            // Return a quit event if we've exhausted all events
            Ok(SimulatedEventSource::char_key('q'))
        }
    }
}
