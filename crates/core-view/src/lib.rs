//! Per-window view over a shared buffer.
//!
//! A [`WindowBuffer`] owns only presentation state: `pos`, the buffer
//! coordinate of the top-left visible character, and `cursor`, the
//! window-relative position. The buffer coordinate under edit is
//! `cursor + pos - (1,1)`. The view draws rectangular slices, keeps the
//! cursor inside the configured scroll-off margins by moving `pos`, and
//! repaints only the affected line range after an edit.
//!
//! The buffer itself is borrowed per call; ownership stays with the editor
//! so several views can share one buffer.

use core_config::Settings;
use core_keymap::Mode;
use core_layout::{Cursor, Window};
use core_terminal::{Style, Terminal};
use core_text::Buffer;

mod actions;
mod keys;

/// Mutable editor-wide state threaded into view operations.
pub struct EditCtx<'a> {
    pub mode: &'a mut Mode,
    pub clipboard: &'a mut String,
    pub settings: &'a Settings,
}

/// Line range scheduled for repaint after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Redraw {
    None,
    Line(u32),
    /// This line through the end of the buffer (line count changed).
    ToEnd(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuffer {
    /// Buffer coordinate of the top-left visible character.
    pub pos: Cursor,
    /// Window-relative cursor, 1-based.
    pub cursor: Cursor,
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self {
            pos: Cursor::new(1, 1),
            cursor: Cursor::new(1, 1),
        }
    }

    /// The buffer coordinate being edited.
    pub fn buff_cursor(&self) -> Cursor {
        self.cursor + self.pos - Cursor::new(1, 1)
    }

    /// Move the buffer cursor, leaving `pos` for `validate_cursor` to fix.
    pub fn set_buff_cursor(&mut self, bc: Cursor) {
        self.cursor = bc - self.pos + Cursor::new(1, 1);
    }

    pub(crate) fn buff_row(&self) -> u32 {
        self.buff_cursor().row.max(1) as u32
    }

    pub(crate) fn buff_col0(&self) -> usize {
        (self.buff_cursor().col.max(1) - 1) as usize
    }

    /// Paint buffer lines into the window.
    ///
    /// `first == 0` requests a full repaint of the visible area plus the
    /// status line. Otherwise `first..=last` are buffer line numbers,
    /// clipped against the viewport; an empty intersection draws nothing.
    pub fn draw(&self, buff: &Buffer, win: Window, term: &mut dyn Terminal, first: u32, last: u32) {
        if win.height <= 0 || win.width <= 0 {
            return;
        }
        let top_line = self.pos.row.max(1) as u32;
        let height = win.height as u32;
        let (off_first, off_last) = if first == 0 {
            (0, height - 1)
        } else {
            let lo = first.max(top_line);
            let hi = last.min(top_line + height - 1);
            if hi < lo {
                return;
            }
            (lo - top_line, hi - top_line)
        };
        let width = win.width as usize;
        let start_col = (self.pos.col.max(1) - 1) as usize;
        term.hide_cursor();
        for off in off_first..=off_last {
            let line_no = top_line + off;
            term.goto(win.top as u16 + off as u16, win.left as u16);
            if line_no <= buff.line_count() {
                let text = core_text::slice_cols(buff.line(line_no), start_col, width);
                term.put_str(text);
                for _ in core_text::char_count(text)..width {
                    term.put_str(" ");
                }
            } else {
                term.put_str("~");
                for _ in 1..width {
                    term.put_str(" ");
                }
            }
            // Yield point between rows so a slow link drains per line.
            let _ = term.flush();
        }
        if first == 0 {
            self.draw_status(buff, win, term);
        }
        term.show_cursor();
    }

    /// Status line under the window: buffer cursor on the left, filename
    /// (starred when modified) on the right, truncated from the left when
    /// the window is narrow. Skipped when the row falls off the terminal.
    pub fn draw_status(&self, buff: &Buffer, win: Window, term: &mut dyn Terminal) {
        let row = win.top + win.height;
        if row < 1 || row > term.rows() as i16 || win.width <= 0 {
            return;
        }
        let width = win.width as usize;
        let left = self.buff_cursor().to_string();
        let mut name = if buff.filename().is_empty() {
            String::from("[No Name]")
        } else {
            buff.filename().to_string()
        };
        if buff.modified() {
            name.push('*');
        }
        let line = if core_text::char_count(&left) + core_text::char_count(&name) + 1 <= width {
            let pad = width - core_text::char_count(&left) - core_text::char_count(&name);
            format!("{left}{}{name}", " ".repeat(pad))
        } else {
            let full = format!("{left} {name}");
            let cut = core_text::char_count(&full).saturating_sub(width);
            full.chars().skip(cut).collect()
        };
        term.save_cursor();
        term.goto(row as u16, win.left as u16);
        term.set_style(Style::Status);
        term.put_str(&line);
        term.set_style(Style::Normal);
        term.restore_cursor();
        let _ = term.flush();
    }

    /// Re-establish the view invariants after a motion or edit.
    ///
    /// The buffer cursor is pinned inside the document, `pos` scrolls so the
    /// window keeps `sidescrolloff`/`scrolloff` cells of context around the
    /// cursor, and `pos` never runs past line length or line count. A `pos`
    /// change triggers a full repaint, otherwise only the status line is
    /// refreshed; either way the terminal cursor ends at the view cursor.
    pub fn validate_cursor(
        &mut self,
        buff: &Buffer,
        win: Window,
        term: &mut dyn Terminal,
        settings: &Settings,
    ) {
        if win.height <= 0 || win.width <= 0 {
            return;
        }
        let lines = buff.line_count().max(1) as i16;
        let mut bc = self.buff_cursor();
        bc.row = bc.row.clamp(1, lines);
        bc.col = bc.col.max(1);

        let w = win.width;
        let h = win.height;
        let so_col = (settings.sidescrolloff as i16).min((w - 1) / 2);
        let so_row = (settings.scrolloff as i16).min((h - 1) / 2);

        let mut pos = self.pos;
        if bc.col - pos.col + 1 < 1 + so_col {
            pos.col = bc.col - so_col;
        }
        if bc.col - pos.col + 1 > w - so_col {
            pos.col = bc.col - w + 1 + so_col;
        }
        if pos.col < 1 {
            pos.col = 1;
        }
        let line_len = core_text::char_count(buff.line(bc.row as u32)) as i16;
        if line_len > 0 && pos.col > line_len {
            pos.col = line_len;
        }

        if bc.row - pos.row + 1 < 1 + so_row {
            pos.row = bc.row - so_row;
        }
        if bc.row - pos.row + 1 > h - so_row {
            pos.row = bc.row - h + 1 + so_row;
        }
        pos.row = pos.row.clamp(1, lines);

        let moved = pos != self.pos;
        self.pos = pos;
        self.cursor = bc - pos + Cursor::new(1, 1);
        // Off-window remnants (pos capped by line length or document edge)
        // pull the cursor back instead of drawing outside the rectangle.
        self.cursor.row = self.cursor.row.clamp(1, h);
        self.cursor.col = self.cursor.col.clamp(1, w);

        if moved {
            self.draw(buff, win, term, 0, 0);
        } else {
            self.draw_status(buff, win, term);
        }
        self.place_cursor(win, term);
    }

    /// Put the hardware cursor on the view cursor.
    pub fn place_cursor(&self, win: Window, term: &mut dyn Terminal) {
        term.goto(
            (win.top + self.cursor.row - 1) as u16,
            (win.left + self.cursor.col - 1) as u16,
        );
        let _ = term.flush();
    }

    pub(crate) fn apply_redraw(
        &self,
        redraw: Redraw,
        buff: &Buffer,
        win: Window,
        term: &mut dyn Terminal,
    ) {
        match redraw {
            Redraw::None => {}
            Redraw::Line(n) => self.draw(buff, win, term, n, n),
            Redraw::ToEnd(n) => self.draw(buff, win, term, n, buff.line_count().max(n)),
        }
    }
}
