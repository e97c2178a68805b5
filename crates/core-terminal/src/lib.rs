//! Terminal abstraction consumed by the drawing layers.
//!
//! The editor owns the terminal exclusively while active and drives it with
//! absolute cursor addressing plus erase sequences; there is no retained
//! frame buffer. Backends queue primitive commands in issue order and emit
//! them on `flush` so a slow serial link sees one coherent burst per redraw.
//!
//! Two backends ship: [`CrosstermTerminal`] for a real tty and
//! [`GridTerminal`] for tests, which records writes into a character grid
//! and counts out-of-bounds cells so clipping contracts can be asserted.

use std::fmt;

mod crossterm_backend;
mod grid;

pub use crossterm_backend::{CrosstermTerminal, TerminalGuard};
pub use grid::GridTerminal;

/// Normalized key codes delivered by the host input loop.
///
/// Printable bytes arrive as `Char`; control chords as `Ctrl` with the plain
/// lowercase letter. The editor core never sees raw escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
}

impl KeyCode {
    /// True for the byte range an edit mode splices into the buffer.
    pub fn printable(self) -> Option<char> {
        match self {
            KeyCode::Char(c) if (c as u32) >= 0x20 => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c:?}"),
            KeyCode::Ctrl(c) => write!(f, "<C-{c}>"),
            other => write!(f, "<{other:?}>"),
        }
    }
}

/// Text attribute selected before a run of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Normal,
    /// Status line segments.
    Status,
    /// Error reports in the status region.
    Error,
}

/// Direct-drive terminal surface.
///
/// Coordinates are 1-based `(row, col)` matching the CUP sequence. Commands
/// are buffered; nothing reaches the device until [`Terminal::flush`].
/// Helpers that move the cursor must bracket themselves with
/// `save_cursor`/`restore_cursor` so surrounding caller state is preserved.
pub trait Terminal {
    fn rows(&self) -> u16;
    fn cols(&self) -> u16;

    fn goto(&mut self, row: u16, col: u16);
    fn save_cursor(&mut self);
    fn restore_cursor(&mut self);
    fn hide_cursor(&mut self);
    fn show_cursor(&mut self);

    fn set_style(&mut self, style: Style);
    fn put_str(&mut self, s: &str);
    fn clear(&mut self);

    /// Emit queued commands to the device.
    fn flush(&mut self) -> anyhow::Result<()>;

    /// Vertical run of `len` separator glyphs starting at `(row, col)`.
    fn vline(&mut self, row: u16, col: u16, len: u16) {
        for i in 0..len {
            self.goto(row + i, col);
            self.put_str("\u{2502}");
        }
    }

    /// Horizontal run of `len` separator glyphs starting at `(row, col)`.
    fn hline(&mut self, row: u16, col: u16, len: u16) {
        self.goto(row, col);
        for _ in 0..len {
            self.put_str("\u{2500}");
        }
    }
}
