//! Crossterm-backed terminal with queued command emission.
//!
//! Commands accumulate in an in-memory byte buffer via `queue!` and reach
//! stdout only on `flush`, preserving issue order with a single write burst
//! per redraw. Raw mode and the alternate screen are managed by an RAII
//! guard so any early return or panic restores the user's shell.

use std::io::Write;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, RestorePosition, SavePosition, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use tracing::error;

use crate::{Style, Terminal};

pub struct CrosstermTerminal {
    rows: u16,
    cols: u16,
    queue: Vec<u8>,
    entered: bool,
}

/// Restores the terminal (raw mode off, main screen) when dropped.
pub struct TerminalGuard<'a> {
    term: &'a mut CrosstermTerminal,
}

impl CrosstermTerminal {
    pub fn new() -> Result<Self> {
        let (cols, rows) = crossterm::terminal::size().context("query terminal size")?;
        Ok(Self {
            rows,
            cols,
            queue: Vec::with_capacity(4096),
            entered: false,
        })
    }

    /// Enter raw mode + alternate screen, returning a guard that leaves on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard { term: self })
    }

    /// Record a new device size after a resize event.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    /// Enter raw mode + alternate screen. `Drop` restores both, so callers
    /// that keep the terminal for the whole session need no guard.
    pub fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode().context("enable raw mode")?;
            execute!(std::io::stdout(), EnterAlternateScreen)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(std::io::stdout(), Show, LeaveAlternateScreen)?;
            disable_raw_mode().context("disable raw mode")?;
            self.entered = false;
        }
        Ok(())
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            error!(target: "terminal", ?e, "terminal_restore_failed");
        }
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.term.leave() {
            error!(target: "terminal", ?e, "terminal_restore_failed");
        }
    }
}

impl Terminal for CrosstermTerminal {
    fn rows(&self) -> u16 {
        self.rows
    }

    fn cols(&self) -> u16 {
        self.cols
    }

    fn goto(&mut self, row: u16, col: u16) {
        // MoveTo is 0-based; the editor speaks 1-based CUP coordinates.
        let _ = queue!(
            self.queue,
            MoveTo(col.saturating_sub(1), row.saturating_sub(1))
        );
    }

    fn save_cursor(&mut self) {
        let _ = queue!(self.queue, SavePosition);
    }

    fn restore_cursor(&mut self) {
        let _ = queue!(self.queue, RestorePosition);
    }

    fn hide_cursor(&mut self) {
        let _ = queue!(self.queue, Hide);
    }

    fn show_cursor(&mut self) {
        let _ = queue!(self.queue, Show);
    }

    fn set_style(&mut self, style: Style) {
        let _ = match style {
            Style::Normal => queue!(self.queue, ResetColor),
            Style::Status => queue!(
                self.queue,
                SetAttribute(crossterm::style::Attribute::Reverse)
            ),
            Style::Error => queue!(self.queue, SetForegroundColor(Color::Red)),
        };
        if style == Style::Normal {
            let _ = queue!(
                self.queue,
                SetAttribute(crossterm::style::Attribute::Reset)
            );
        }
    }

    fn put_str(&mut self, s: &str) {
        let _ = queue!(self.queue, Print(s));
    }

    fn clear(&mut self) {
        let _ = queue!(self.queue, Clear(ClearType::All));
    }

    fn flush(&mut self) -> Result<()> {
        let mut out = std::io::stdout();
        out.write_all(&self.queue).context("write queued commands")?;
        out.flush().context("flush stdout")?;
        self.queue.clear();
        Ok(())
    }

    fn vline(&mut self, row: u16, col: u16, len: u16) {
        // One cursor placement, then glyph + down + left per row.
        self.goto(row, col);
        for _ in 0..len {
            let _ = queue!(
                self.queue,
                Print("\u{2502}"),
                crossterm::cursor::MoveDown(1),
                crossterm::cursor::MoveLeft(1)
            );
        }
    }
}
