//! Application of resolved editing actions to the buffer under this view.
//!
//! Every action follows the same epilogue: repaint the affected line range
//! (the current line by default, through end-of-buffer when the line count
//! changed), then re-validate the cursor. Motions skip the content repaint
//! entirely; scrolling, when needed, is triggered from `validate_cursor`.

use core_keymap::{Action, Mode};
use core_layout::{Cursor, Window};
use core_terminal::Terminal;
use core_text::{Buffer, words};
use tracing::trace;

use crate::{EditCtx, Redraw, WindowBuffer};

impl WindowBuffer {
    pub fn on_action(
        &mut self,
        action: Action,
        buff: &mut Buffer,
        win: Window,
        term: &mut dyn Terminal,
        ctx: &mut EditCtx<'_>,
    ) {
        let bc = self.buff_cursor();
        let row = self.buff_row();
        let col0 = self.buff_col0();
        let mut redraw = Redraw::None;

        match action {
            Action::MoveLeft => self.set_buff_cursor(bc + Cursor::new(0, -1)),
            Action::MoveRight => self.set_buff_cursor(bc + Cursor::new(0, 1)),
            Action::MoveUp => self.set_buff_cursor(bc + Cursor::new(-1, 0)),
            Action::MoveDown => self.set_buff_cursor(bc + Cursor::new(1, 0)),
            Action::MoveLineBegin => self.set_buff_cursor(Cursor::new(bc.row, 1)),
            Action::MoveLineEnd => {
                let len = core_text::char_count(buff.line(row)) as i16;
                self.set_buff_cursor(Cursor::new(bc.row, len.max(1)));
            }
            Action::MoveDocEnd => {
                self.set_buff_cursor(Cursor::new(buff.line_count().max(1) as i16, bc.col));
            }
            Action::NextWord => {
                let (r, c) = words::forward(buff, row, col0);
                self.set_buff_cursor(Cursor::new(r as i16, c as i16 + 1));
            }
            Action::PrevWord => {
                let (r, c) = words::backward(buff, row, col0);
                self.set_buff_cursor(Cursor::new(r as i16, c as i16 + 1));
            }

            Action::Insert => *ctx.mode = Mode::Insert,
            Action::Append => {
                *ctx.mode = Mode::Insert;
                self.set_buff_cursor(bc + Cursor::new(0, 1));
            }
            Action::Replace => *ctx.mode = Mode::Replace,
            Action::OpenLine => {
                buff.insert_line(row + 1);
                *ctx.mode = Mode::Insert;
                self.set_buff_cursor(Cursor::new(bc.row + 1, 1));
                redraw = Redraw::ToEnd(row);
            }

            Action::Delete => {
                let line = buff.line_mut(row);
                if let Some(c) = core_text::remove_char(line, col0) {
                    ctx.clipboard.clear();
                    ctx.clipboard.push(c);
                    // Step off the now-missing last column.
                    if col0 >= core_text::char_count(line) && col0 > 0 {
                        self.set_buff_cursor(bc + Cursor::new(0, -1));
                    }
                    redraw = Redraw::Line(row);
                }
            }
            Action::DeleteLine => {
                if row <= buff.line_count() {
                    *ctx.clipboard = buff.delete_line(row);
                    ctx.clipboard.push('\r');
                    redraw = Redraw::ToEnd(row);
                }
            }
            Action::DeleteWord => {
                redraw = self.delete_word(buff, row, col0);
            }
            Action::Change => {
                let line = buff.line_mut(row);
                let len = core_text::char_count(line);
                *ctx.clipboard = core_text::remove_cols(line, col0, len);
                *ctx.mode = Mode::Insert;
                redraw = Redraw::Line(row);
            }
            Action::ChangeWord => {
                redraw = self.delete_word(buff, row, col0);
                *ctx.mode = Mode::Insert;
            }
            Action::Join => {
                if row < buff.line_count() {
                    let frag = buff.delete_line(row + 1);
                    let line = buff.line_mut(row);
                    if line.ends_with(' ') {
                        line.pop();
                    }
                    let frag = frag.trim();
                    if !frag.is_empty() {
                        line.push(' ');
                        line.push_str(frag);
                    }
                    redraw = Redraw::ToEnd(row);
                }
            }

            Action::CopyLine => {
                *ctx.clipboard = buff.line(row).to_string();
                ctx.clipboard.push('\r');
            }
            Action::PutAfter => redraw = self.put(buff, ctx, row, col0, true),
            Action::PutBefore => redraw = self.put(buff, ctx, row, col0, false),

            Action::Undo | Action::SearchNext | Action::CopyWord | Action::DeleteTo => {
                // Reserved table entries without behavior yet.
                trace!(target: "input.resolve", ?action, "reserved_action_ignored");
            }
            Action::Repeat | Action::Quit => {
                // Editor-level actions are consumed before view dispatch.
            }
        }

        self.apply_redraw(redraw, buff, win, term);
        self.validate_cursor(buff, win, term, ctx.settings);
    }

    /// Delete from the cursor to the next word start. A word motion that
    /// leaves the line clips the deletion at end-of-line.
    fn delete_word(&mut self, buff: &mut Buffer, row: u32, col0: usize) -> Redraw {
        let (r, c) = words::forward(buff, row, col0);
        let line = buff.line_mut(row);
        let end = if r == row {
            c
        } else {
            core_text::char_count(line)
        };
        if end > col0 {
            core_text::remove_cols(line, col0, end);
            Redraw::Line(row)
        } else {
            Redraw::None
        }
    }

    /// PUT_AFTER / PUT_BEFORE. A clipboard holding `\r` is line material:
    /// each segment becomes a new line after/before the cursor line and the
    /// cursor lands on the first of them. Otherwise the text is spliced into
    /// the current line and the cursor advances by its length.
    fn put(
        &mut self,
        buff: &mut Buffer,
        ctx: &mut EditCtx<'_>,
        row: u32,
        col0: usize,
        after: bool,
    ) -> Redraw {
        if ctx.clipboard.is_empty() {
            return Redraw::None;
        }
        let clip = ctx.clipboard.clone();
        if clip.contains('\r') {
            let base = if after { row + 1 } else { row };
            let mut n = base;
            for seg in clip.split_terminator('\r') {
                buff.insert_line(n);
                *buff.line_mut(n) = seg.to_string();
                n += 1;
            }
            self.set_buff_cursor(Cursor::new(base as i16, 1));
            Redraw::ToEnd(row.min(base))
        } else {
            let count = core_text::char_count(&clip) as i16;
            let line = buff.line_mut(row);
            let len = core_text::char_count(line);
            let at = if after {
                (col0 + 1).min(len)
            } else {
                col0.min(len)
            };
            for (i, ch) in clip.chars().enumerate() {
                core_text::insert_char(line, at + i, ch);
            }
            let bc = self.buff_cursor();
            self.set_buff_cursor(bc + Cursor::new(0, count));
            Redraw::Line(row)
        }
    }
}
