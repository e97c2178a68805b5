//! The editor proper: mode state machine, key routing, and window plumbing.
//!
//! Keys arrive one at a time from the host loop. NORMAL-mode printables
//! accumulate in `scmd` until the resolver recognizes a command or rejects
//! the string; digits build the count prefix (`0` only extends an existing
//! count, otherwise it is the line-start motion); everything else routes to
//! the active view. The three accumulators interact nowhere else: digits
//! feed `rpt_count` only while `scmd` is empty, printables feed `scmd`, and
//! every non-digit key lands in `record` unless a playback is running.
//!
//! Playback re-enters `on_key` synchronously for each recorded key, bounded
//! by the record length, so the host never observes re-entrancy.
//!
//! Buffers are keyed by resolved path; the reserved key `":"` holds the
//! command-line buffer viewed through the bottom strip (Wid `0x4000`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use core_config::Settings;
use core_keymap::{Action, Mode, Resolution, resolve};
use core_layout::{Cursor, SplitAxis, Splitter, Wid, Window};
use core_terminal::{KeyCode, Style, Terminal};
use core_text::Buffer;
use core_view::{EditCtx, WindowBuffer};
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

mod command;

/// Reserved buffer name for the command line; never a filesystem path.
pub const CMD_BUFFER_NAME: &str = ":";

/// Editing region above the top-level split.
const EDIT_WID: Wid = Wid(0xC000);
/// Two-row command/status strip below it.
const STATUS_WID: Wid = Wid(0x4000);

/// What the host loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct OpenBuffer {
    buff: Buffer,
    views: BTreeMap<Wid, WindowBuffer>,
}

pub struct Editor {
    screen: Window,
    splitter: Splitter,
    curwid: Wid,
    mode: Mode,
    buffers: BTreeMap<String, OpenBuffer>,

    // Modal input accumulators.
    scmd: String,
    rpt_count: u32,
    last_was_digit: bool,
    record: SmallVec<[KeyCode; 32]>,
    playing: bool,
    pending_repeat: u32,

    clipboard: String,
    settings: Settings,
    base_settings: Settings,
    cwd: PathBuf,
    next_split: SplitAxis,
    last_opened: Option<String>,
}

impl Editor {
    pub fn new(term: &dyn Terminal, settings: Settings, cwd: PathBuf) -> Self {
        let screen = Window::screen(term);
        let mut effective = settings;
        effective.clamp_to(term.rows(), term.cols());
        let splitter = Splitter::new(SplitAxis::Horizontal, term.rows().saturating_sub(3));

        let mut cmd_views = BTreeMap::new();
        cmd_views.insert(STATUS_WID, WindowBuffer::new());
        let mut cmd_buff = Buffer::new(CMD_BUFFER_NAME);
        // Two seeded rows: the echo line and the message line.
        cmd_buff.line_mut(2);
        let mut buffers = BTreeMap::new();
        buffers.insert(
            CMD_BUFFER_NAME.to_string(),
            OpenBuffer {
                buff: cmd_buff,
                views: cmd_views,
            },
        );

        info!(target: "runtime", cols = term.cols(), rows = term.rows(), "editor_start");
        Self {
            screen,
            splitter,
            curwid: EDIT_WID,
            mode: Mode::Normal,
            buffers,
            scmd: String::new(),
            rpt_count: 0,
            last_was_digit: false,
            record: SmallVec::new(),
            playing: false,
            pending_repeat: 0,
            clipboard: String::new(),
            settings: effective,
            base_settings: settings,
            cwd,
            next_split: SplitAxis::Vertical,
            last_opened: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    pub fn curwid(&self) -> Wid {
        self.curwid
    }

    pub fn active_buffer(&self) -> Option<&Buffer> {
        let curwid = self.curwid;
        self.buffers
            .values()
            .find(|b| b.views.contains_key(&curwid))
            .map(|b| &b.buff)
    }

    pub fn active_view(&self) -> Option<&WindowBuffer> {
        let curwid = self.curwid;
        self.buffers
            .values()
            .find(|b| b.views.contains_key(&curwid))
            .and_then(|b| b.views.get(&curwid))
    }

    /// Open `token` (resolved against the working directory) in a window.
    /// The first file takes the whole editing region; each further distinct
    /// file splits the current window, alternating vertical/horizontal at
    /// half the current dimension. Re-opening an already-loaded path just
    /// focuses its window.
    pub fn open(&mut self, token: &str, term: &mut dyn Terminal) {
        let resolved = if Path::new(token).is_absolute() {
            PathBuf::from(token)
        } else {
            self.cwd.join(token)
        };
        let key = resolved.to_string_lossy().into_owned();
        if key == CMD_BUFFER_NAME {
            warn!(target: "io", "reserved_buffer_name");
            return;
        }
        if let Some(existing) = self.buffers.get(&key) {
            if let Some(&wid) = existing.views.keys().next() {
                self.curwid = wid;
            }
            self.last_opened = Some(key);
            return;
        }

        let mut buff = Buffer::new("");
        if let Err(e) = buff.read(&resolved) {
            // New or unreadable file: the buffer stays empty but keeps the
            // target name so `:w` can create it.
            debug!(target: "io", file = %resolved.display(), ?e, "open_fresh_or_failed");
            self.report(term, &format!("\"{}\" [new file]", resolved.display()), false);
        }

        let wid = if self.file_buffer_count() == 0 {
            EDIT_WID
        } else {
            self.split_for_new_buffer(term)
        };
        let mut views = BTreeMap::new();
        views.insert(wid, WindowBuffer::new());
        self.buffers.insert(key.clone(), OpenBuffer { buff, views });
        self.curwid = wid;
        self.last_opened = Some(key);
    }

    /// Open an unnamed scratch buffer in the editing region (no argv files).
    pub fn open_scratch(&mut self) {
        let mut views = BTreeMap::new();
        views.insert(EDIT_WID, WindowBuffer::new());
        self.buffers.insert(
            String::new(),
            OpenBuffer {
                buff: Buffer::new(""),
                views,
            },
        );
        self.curwid = EDIT_WID;
        self.last_opened = Some(String::new());
    }

    /// Register an additional view of an already-open buffer through `wid`.
    /// No-op (false) when the buffer is unknown or already viewed there; a
    /// buffer can be shown in any number of windows and every view sees the
    /// others' edits.
    pub fn add_window(&mut self, token: &str, wid: Wid) -> bool {
        let resolved = if Path::new(token).is_absolute() {
            PathBuf::from(token)
        } else {
            self.cwd.join(token)
        };
        let key = resolved.to_string_lossy().into_owned();
        let Some(open) = self.buffers.get_mut(&key) else {
            return false;
        };
        if open.views.contains_key(&wid) {
            return false;
        }
        open.views.insert(wid, WindowBuffer::new());
        debug!(target: "runtime", wid = %wid, buffer = %key, "view_added");
        true
    }

    /// Apply a `+N` argv token: initial cursor row in the most recently
    /// opened buffer.
    pub fn set_initial_row(&mut self, row: u32) {
        let Some(key) = self.last_opened.clone() else {
            return;
        };
        if let Some(open) = self.buffers.get_mut(&key)
            && let Some(view) = open.views.values_mut().next()
        {
            view.set_buff_cursor(Cursor::new(row.max(1) as i16, 1));
        }
    }

    fn file_buffer_count(&self) -> usize {
        self.buffers
            .keys()
            .filter(|k| k.as_str() != CMD_BUFFER_NAME)
            .count()
    }

    fn split_for_new_buffer(&mut self, term: &mut dyn Terminal) -> Wid {
        let cur = self.curwid;
        let Some(win) = self.splitter.calc_window(cur, self.screen) else {
            self.report(term, "no window for split", true);
            return cur;
        };
        let (axis, size) = match self.next_split {
            SplitAxis::Vertical => (SplitAxis::Vertical, (win.width / 2).max(1) as u16),
            SplitAxis::Horizontal => (SplitAxis::Horizontal, (win.height / 2).max(1) as u16),
        };
        if self.splitter.split(cur, axis, size) {
            self.next_split = match axis {
                SplitAxis::Vertical => SplitAxis::Horizontal,
                SplitAxis::Horizontal => SplitAxis::Vertical,
            };
            // The old window re-addresses through the new node's side_1
            // chain; the fresh buffer takes side_0.
            cur.child_0()
        } else {
            self.report(term, "split failed", true);
            cur
        }
    }

    /// Single entry point for every keystroke.
    pub fn on_key(&mut self, key: KeyCode, term: &mut dyn Terminal) -> Flow {
        match key {
            KeyCode::Ctrl('l') => {
                self.repaint(term);
                return Flow::Continue;
            }
            KeyCode::Ctrl('c') => {
                info!(target: "runtime", "interrupt");
                return Flow::Quit;
            }
            KeyCode::Esc => return self.on_esc(term),
            _ => {}
        }
        // Arrows are motions whatever the mode.
        if let Some(action) = arrow_action(key) {
            self.note_key(key, true);
            self.dispatch_action(action, term);
            return Flow::Continue;
        }
        match self.mode {
            Mode::Command => self.on_command_key(key, term),
            Mode::Insert | Mode::Replace => {
                self.note_key(key, false);
                self.route_key_to_view(key, term);
                Flow::Continue
            }
            Mode::Normal => self.on_normal_key(key, term),
        }
    }

    /// Record a key unless a playback is feeding us. `fresh` marks the
    /// start of a new command sequence, which resets the recording.
    fn note_key(&mut self, key: KeyCode, fresh: bool) {
        if self.playing {
            return;
        }
        if fresh && self.mode == Mode::Normal && self.scmd.is_empty() {
            self.record.clear();
        }
        self.record.push(key);
    }

    fn on_normal_key(&mut self, key: KeyCode, term: &mut dyn Terminal) -> Flow {
        if let KeyCode::Char(c) = key {
            // Count prefix: digits while no command is pending. A bare `0`
            // is the line-start alias, `0` after a digit extends the count.
            if c.is_ascii_digit() && self.scmd.is_empty() && (c != '0' || self.last_was_digit) {
                self.rpt_count = self
                    .rpt_count
                    .saturating_mul(10)
                    .saturating_add(u32::from(c as u8 - b'0'))
                    .min(9_999);
                self.last_was_digit = true;
                return Flow::Continue;
            }
            self.last_was_digit = false;

            if c == ':' && self.scmd.is_empty() {
                self.mode = Mode::Command;
                self.scmd.clear();
                self.echo_cmdline(term);
                return Flow::Continue;
            }
            // Dot-repeat replays the record; it never records itself.
            if c == '.' && self.scmd.is_empty() {
                let n = self.rpt_count.max(1);
                self.rpt_count = 0;
                let keys: Vec<KeyCode> = self.record.to_vec();
                return self.play(&keys, n, term);
            }
            if (c as u32) >= 0x20 {
                self.note_key(key, true);
                self.scmd.push(c);
                return match resolve(&self.scmd) {
                    Resolution::Action(action) => {
                        self.scmd.clear();
                        self.run_action(action, term)
                    }
                    Resolution::Unterminated => Flow::Continue,
                    Resolution::Unknown => {
                        debug!(target: "input.resolve", cmd = %self.scmd, "unknown_command");
                        self.scmd.clear();
                        self.rpt_count = 0;
                        Flow::Continue
                    }
                };
            }
            return Flow::Continue;
        }
        if matches!(
            key,
            KeyCode::Enter
                | KeyCode::Home
                | KeyCode::End
                | KeyCode::Backspace
                | KeyCode::Delete
                | KeyCode::Tab
        ) {
            self.note_key(key, true);
            self.route_key_to_view(key, term);
        }
        Flow::Continue
    }

    /// Dispatch a resolved action, honoring the count prefix: immediate
    /// NORMAL commands replay at once, edit-entering commands defer the
    /// remaining repeats to the closing Esc.
    fn run_action(&mut self, action: Action, term: &mut dyn Terminal) -> Flow {
        let count = self.rpt_count.max(1);
        self.rpt_count = 0;
        match action {
            Action::Quit => return self.request_quit(false, term),
            Action::Repeat => {
                let keys: Vec<KeyCode> = self.record.to_vec();
                return self.play(&keys, count, term);
            }
            _ => {}
        }
        self.dispatch_action(action, term);
        if count > 1 {
            if self.mode.is_edit() {
                self.pending_repeat = count - 1;
            } else if self.mode == Mode::Normal && !self.playing {
                let keys: Vec<KeyCode> = self.record.to_vec();
                return self.play(&keys, count - 1, term);
            }
        }
        Flow::Continue
    }

    fn on_esc(&mut self, term: &mut dyn Terminal) -> Flow {
        self.scmd.clear();
        self.rpt_count = 0;
        self.last_was_digit = false;
        let was_command = self.mode == Mode::Command;
        self.mode = Mode::Normal;
        if was_command {
            self.reset_cmdline(term);
            return Flow::Continue;
        }
        if !self.playing {
            self.record.push(KeyCode::Esc);
            let reps = self.pending_repeat;
            self.pending_repeat = 0;
            if reps > 0 {
                let keys: Vec<KeyCode> = self.record.to_vec();
                if self.play(&keys, reps, term) == Flow::Quit {
                    return Flow::Quit;
                }
            }
        }
        self.revalidate_active(term);
        Flow::Continue
    }

    fn on_command_key(&mut self, key: KeyCode, term: &mut dyn Terminal) -> Flow {
        match key {
            KeyCode::Enter => {
                let flow = self.eval_command(term);
                self.mode = Mode::Normal;
                self.scmd.clear();
                self.reset_cmdline(term);
                flow
            }
            KeyCode::Backspace => {
                self.scmd.pop();
                self.echo_cmdline(term);
                Flow::Continue
            }
            KeyCode::Char(c) if (c as u32) >= 0x20 => {
                self.scmd.push(c);
                self.echo_cmdline(term);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    /// Re-feed recorded keys through `on_key`, `count` times. Bounded
    /// recursion: depth one, guarded by `playing`.
    fn play(&mut self, keys: &[KeyCode], count: u32, term: &mut dyn Terminal) -> Flow {
        if self.playing || keys.is_empty() || count == 0 {
            return Flow::Continue;
        }
        debug!(target: "input", count, len = keys.len(), "playback");
        self.playing = true;
        for _ in 0..count {
            for &k in keys {
                if self.on_key(k, term) == Flow::Quit {
                    self.playing = false;
                    return Flow::Quit;
                }
            }
        }
        self.playing = false;
        Flow::Continue
    }

    fn dispatch_action(&mut self, action: Action, term: &mut dyn Terminal) {
        let curwid = self.curwid;
        let screen = self.screen;
        let Some(win) = self.splitter.calc_window(curwid, screen) else {
            self.report(term, &format!("no window for {curwid}"), true);
            return;
        };
        let Editor {
            buffers,
            mode,
            clipboard,
            settings,
            splitter,
            ..
        } = self;
        let Some(open) = buffers.values_mut().find(|b| b.views.contains_key(&curwid)) else {
            debug!(target: "runtime", wid = %curwid, "no_buffer_for_window");
            return;
        };
        let before = open.buff.line_count();
        {
            let OpenBuffer { buff, views } = open;
            let Some(view) = views.get_mut(&curwid) else {
                return;
            };
            let mut ctx = EditCtx {
                mode,
                clipboard,
                settings: &*settings,
            };
            view.on_action(action, buff, win, term, &mut ctx);
        }
        if open.buff.line_count() != before {
            Self::refresh_siblings(splitter, screen, open, curwid, settings, term);
            if let Some(view) = open.views.get(&curwid) {
                view.place_cursor(win, term);
            }
        }
    }

    fn route_key_to_view(&mut self, key: KeyCode, term: &mut dyn Terminal) {
        let curwid = self.curwid;
        let screen = self.screen;
        let Some(win) = self.splitter.calc_window(curwid, screen) else {
            self.report(term, &format!("no window for {curwid}"), true);
            return;
        };
        let Editor {
            buffers,
            mode,
            clipboard,
            settings,
            splitter,
            ..
        } = self;
        let Some(open) = buffers.values_mut().find(|b| b.views.contains_key(&curwid)) else {
            return;
        };
        let before = open.buff.line_count();
        {
            let OpenBuffer { buff, views } = open;
            let Some(view) = views.get_mut(&curwid) else {
                return;
            };
            let mut ctx = EditCtx {
                mode,
                clipboard,
                settings: &*settings,
            };
            view.on_key(key, buff, win, term, &mut ctx);
        }
        if open.buff.line_count() != before {
            Self::refresh_siblings(splitter, screen, open, curwid, settings, term);
            if let Some(view) = open.views.get(&curwid) {
                view.place_cursor(win, term);
            }
        }
    }

    /// Views sharing a buffer observe its mutations; a line-count change
    /// forces each sibling through validate + full redraw.
    fn refresh_siblings(
        splitter: &Splitter,
        screen: Window,
        open: &mut OpenBuffer,
        active: Wid,
        settings: &Settings,
        term: &mut dyn Terminal,
    ) {
        let OpenBuffer { buff, views } = open;
        for (wid, view) in views.iter_mut() {
            if *wid == active {
                continue;
            }
            let Some(win) = splitter.calc_window(*wid, screen) else {
                error!(target: "layout", wid = %wid, "sibling_window_lost");
                continue;
            };
            view.validate_cursor(buff, win, term, settings);
            view.draw(buff, win, term, 0, 0);
        }
    }

    fn revalidate_active(&mut self, term: &mut dyn Terminal) {
        let curwid = self.curwid;
        let screen = self.screen;
        let Some(win) = self.splitter.calc_window(curwid, screen) else {
            return;
        };
        let Editor {
            buffers, settings, ..
        } = self;
        if let Some(open) = buffers.values_mut().find(|b| b.views.contains_key(&curwid)) {
            let OpenBuffer { buff, views } = open;
            if let Some(view) = views.get_mut(&curwid) {
                view.validate_cursor(buff, win, term, settings);
            }
        }
    }

    /// Full screen rebuild: separators, every view, then the cursor.
    pub fn repaint(&mut self, term: &mut dyn Terminal) {
        term.hide_cursor();
        term.clear();
        self.splitter.draw(self.screen, term);
        // Border the focused window; edges shared with split separators
        // redraw the same glyphs.
        if let Some(win) = self.splitter.calc_window(self.curwid, self.screen) {
            win.frame(term);
        }
        let Editor {
            buffers,
            splitter,
            screen,
            ..
        } = self;
        for open in buffers.values_mut() {
            let OpenBuffer { buff, views } = open;
            for (wid, view) in views.iter_mut() {
                if let Some(win) = splitter.calc_window(*wid, *screen) {
                    view.draw(buff, win, term, 0, 0);
                }
            }
        }
        term.show_cursor();
        self.revalidate_active(term);
    }

    /// Terminal resize: new screen rectangle, new strip position, re-clamped
    /// margins, full repaint.
    pub fn on_resize(&mut self, cols: u16, rows: u16, term: &mut dyn Terminal) {
        self.screen = Window::new(1, 1, cols as i16, rows as i16);
        self.splitter.set_root_size(rows.saturating_sub(3));
        self.settings = self.base_settings;
        self.settings.clamp_to(rows, cols);
        info!(target: "runtime", cols, rows, "resize");
        self.repaint(term);
    }

    fn active_modified(&self) -> bool {
        self.active_buffer().map(Buffer::modified).unwrap_or(false)
    }

    fn request_quit(&mut self, force: bool, term: &mut dyn Terminal) -> Flow {
        if !force && self.active_modified() {
            self.report(term, "No write since last change (add !)", false);
            return Flow::Continue;
        }
        info!(target: "runtime", "terminate");
        Flow::Quit
    }

    /// Mirror `scmd` into the command-line buffer and its strip window.
    fn echo_cmdline(&mut self, term: &mut dyn Terminal) {
        let text = format!(":{}", self.scmd);
        let Some(win) = self.splitter.calc_window(STATUS_WID, self.screen) else {
            return;
        };
        let Some(open) = self.buffers.get_mut(CMD_BUFFER_NAME) else {
            return;
        };
        let OpenBuffer { buff, views } = open;
        *buff.line_mut(1) = text.clone();
        if let Some(view) = views.get(&STATUS_WID) {
            view.draw(buff, win, term, 1, 1);
        }
        // Leave the terminal cursor after the echoed text.
        term.goto(
            win.top as u16,
            (win.left as usize + core_text::char_count(&text)) as u16,
        );
        let _ = term.flush();
    }

    fn reset_cmdline(&mut self, term: &mut dyn Terminal) {
        if let Some(open) = self.buffers.get_mut(CMD_BUFFER_NAME) {
            let OpenBuffer { buff, views } = open;
            buff.line_mut(1).clear();
            if let Some(view) = views.get(&STATUS_WID)
                && let Some(win) = self.splitter.calc_window(STATUS_WID, self.screen)
            {
                view.draw(buff, win, term, 1, 1);
            }
        }
        self.revalidate_active(term);
    }

    /// Paint a message into the strip's message row. Internal invariant
    /// failures carry an `Error:` prefix; both kinds land in the log.
    pub fn report(&mut self, term: &mut dyn Terminal, msg: &str, internal: bool) {
        if internal {
            error!(target: "runtime", msg, "internal_error");
        } else {
            warn!(target: "runtime", msg, "user_error");
        }
        let Some(win) = self.splitter.calc_window(STATUS_WID, self.screen) else {
            return;
        };
        let row = (win.top + win.height - 1).max(win.top);
        if row < 1 || row > self.screen.height {
            return;
        }
        let text = if internal {
            format!("Error: {msg}")
        } else {
            msg.to_string()
        };
        let width = win.width.max(0) as usize;
        let mut padded: String = text.chars().take(width).collect();
        for _ in core_text::char_count(&padded)..width {
            padded.push(' ');
        }
        term.save_cursor();
        term.goto(row as u16, win.left as u16);
        term.set_style(Style::Error);
        term.put_str(&padded);
        term.set_style(Style::Normal);
        term.restore_cursor();
        let _ = term.flush();
    }
}

fn arrow_action(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Down => Some(Action::MoveDown),
        KeyCode::Left => Some(Action::MoveLeft),
        KeyCode::Right => Some(Action::MoveRight),
        _ => None,
    }
}
