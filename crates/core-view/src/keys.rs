//! Direct key handling for the view: edit-mode typing and the special keys
//! that behave the same whatever the mode (Home, End, Return, Backspace,
//! Delete, Tab).

use core_keymap::Mode;
use core_layout::Cursor;
use core_layout::Window;
use core_terminal::{KeyCode, Terminal};
use core_text::Buffer;

use crate::{EditCtx, Redraw, WindowBuffer};

impl WindowBuffer {
    pub fn on_key(
        &mut self,
        key: KeyCode,
        buff: &mut Buffer,
        win: Window,
        term: &mut dyn Terminal,
        ctx: &mut EditCtx<'_>,
    ) {
        let bc = self.buff_cursor();
        let row = self.buff_row();
        let col0 = self.buff_col0();
        let edit = ctx.mode.is_edit();
        let mut redraw = Redraw::None;

        match key {
            KeyCode::Enter => {
                if *ctx.mode == Mode::Insert {
                    redraw = self.split_line(buff, row, col0);
                } else {
                    self.set_buff_cursor(Cursor::new(bc.row + 1, 1));
                }
            }
            KeyCode::Home => {
                self.cursor.col = 1;
                self.pos.col = 1;
            }
            KeyCode::End => {
                let len = core_text::char_count(buff.line(row)) as i16;
                self.set_buff_cursor(Cursor::new(bc.row, len.max(1)));
            }
            KeyCode::Backspace => {
                if bc.col > 1 {
                    self.set_buff_cursor(bc + Cursor::new(0, -1));
                    if edit {
                        core_text::remove_char(buff.line_mut(row), col0 - 1);
                        redraw = Redraw::Line(row);
                    }
                }
            }
            KeyCode::Delete => {
                if edit {
                    core_text::remove_char(buff.line_mut(row), col0);
                    redraw = Redraw::Line(row);
                }
            }
            KeyCode::Tab => {
                // Advance to the next tab stop; edit modes splice the
                // spaces in, normal mode only moves.
                if ctx.settings.tabstop > 0 {
                    let ts = ctx.settings.tabstop as usize;
                    let n = ts - (col0 % ts);
                    if edit {
                        for i in 0..n {
                            self.type_char(' ', buff, ctx, row, col0 + i);
                        }
                        redraw = Redraw::Line(row);
                    }
                    self.set_buff_cursor(bc + Cursor::new(0, n as i16));
                }
            }
            KeyCode::Char(c) if edit && (c as u32) >= 0x20 => {
                self.type_char(c, buff, ctx, row, col0);
                self.set_buff_cursor(bc + Cursor::new(0, 1));
                redraw = Redraw::Line(row);
            }
            _ => return,
        }

        self.apply_redraw(redraw, buff, win, term);
        self.validate_cursor(buff, win, term, ctx.settings);
    }

    /// Return in insert mode: the prefix keeps the current line, the suffix
    /// moves to a fresh line below that inherits the current indent, and the
    /// cursor lands just past that indent.
    fn split_line(&mut self, buff: &mut Buffer, row: u32, col0: usize) -> Redraw {
        let line = buff.line_mut(row);
        let len = core_text::char_count(line);
        let suffix = core_text::remove_cols(line, col0.min(len), len);
        let indent: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let indent_cols = core_text::char_count(&indent) as i16;
        buff.insert_line(row + 1);
        let new_line = buff.line_mut(row + 1);
        new_line.push_str(&indent);
        new_line.push_str(&suffix);
        self.set_buff_cursor(Cursor::new(row as i16 + 1, indent_cols + 1));
        Redraw::ToEnd(row)
    }

    /// One printable character: spliced in INSERT, overwritten in REPLACE,
    /// padding with spaces when the cursor sits past end-of-line.
    fn type_char(&self, c: char, buff: &mut Buffer, ctx: &EditCtx<'_>, row: u32, col0: usize) {
        let line = buff.line_mut(row);
        let len = core_text::char_count(line);
        for _ in len..col0 {
            line.push(' ');
        }
        if *ctx.mode == Mode::Replace && col0 < core_text::char_count(line) {
            core_text::remove_char(line, col0);
        }
        core_text::insert_char(line, col0, c);
    }
}
