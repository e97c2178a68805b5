//! End-to-end scenarios through `Editor::on_key`: literal key sequences
//! against real files and a grid terminal, asserting buffer, clipboard,
//! cursor, file, and layout state.

use core_config::Settings;
use core_editor::{Editor, Flow};
use core_layout::Wid;
use core_terminal::{GridTerminal, KeyCode};

struct Rig {
    ed: Editor,
    term: GridTerminal,
    dir: tempfile::TempDir,
}

impl Rig {
    fn new() -> Self {
        let term = GridTerminal::new(80, 24);
        let dir = tempfile::tempdir().expect("tempdir");
        let ed = Editor::new(&term, Settings::default(), dir.path().to_path_buf());
        Self { ed, term, dir }
    }

    fn seed(&self, name: &str, content: &[u8]) {
        std::fs::write(self.dir.path().join(name), content).expect("seed file");
    }

    fn open(&mut self, name: &str) {
        self.ed.open(name, &mut self.term);
        self.ed.repaint(&mut self.term);
    }

    /// Feed a key string; `\x1b` is Esc, `\r` is Return, `\x08` Backspace.
    fn keys(&mut self, keys: &str) -> Flow {
        let mut flow = Flow::Continue;
        for c in keys.chars() {
            let key = match c {
                '\x1b' => KeyCode::Esc,
                '\r' => KeyCode::Enter,
                '\x08' => KeyCode::Backspace,
                '\t' => KeyCode::Tab,
                c => KeyCode::Char(c),
            };
            flow = self.ed.on_key(key, &mut self.term);
            if flow == Flow::Quit {
                break;
            }
        }
        flow
    }

    fn file(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.dir.path().join(name)).expect("read back")
    }

    fn line(&self, n: u32) -> String {
        self.ed
            .active_buffer()
            .map(|b| b.line(n).to_string())
            .unwrap_or_default()
    }

    fn cursor(&self) -> (i16, i16) {
        let bc = self.ed.active_view().expect("active view").buff_cursor();
        (bc.row, bc.col)
    }
}

#[test]
fn open_empty_insert_word_save() {
    let mut rig = Rig::new();
    rig.open("notes.txt");
    let flow = rig.keys("ihello\x1b:w\r");
    assert_eq!(flow, Flow::Continue);
    assert_eq!(rig.file("notes.txt"), b"hello\r\n");
    assert!(!rig.ed.active_buffer().expect("buffer").modified());
}

#[test]
fn count_prefix_repeats_and_dot_repeats_again() {
    let mut rig = Rig::new();
    rig.seed("abc.txt", b"abc\n");
    rig.open("abc.txt");
    rig.keys("3x");
    assert_eq!(rig.line(1), "");
    assert_eq!(rig.ed.clipboard(), "c");
    rig.keys(".");
    assert_eq!(rig.line(1), "");
    assert_eq!(rig.ed.clipboard(), "c");
}

#[test]
fn two_digit_count() {
    let mut rig = Rig::new();
    rig.seed("long.txt", b"abcdefghijklmnop\n");
    rig.open("long.txt");
    rig.keys("12x");
    assert_eq!(rig.line(1), "mnop");
}

#[test]
fn bare_zero_is_line_begin_not_count() {
    let mut rig = Rig::new();
    rig.seed("l.txt", b"hello world\n");
    rig.open("l.txt");
    rig.keys("$");
    assert_eq!(rig.cursor(), (1, 11));
    rig.keys("0");
    assert_eq!(rig.cursor(), (1, 1));
    // 10x: the zero extends the count instead.
    rig.keys("10x");
    assert_eq!(rig.line(1), "d");
}

#[test]
fn word_motion_across_line_break() {
    let mut rig = Rig::new();
    rig.seed("w.txt", b"foo bar\nbaz\n");
    rig.open("w.txt");
    rig.keys("llll");
    assert_eq!(rig.cursor(), (1, 5));
    rig.keys("w");
    assert_eq!(rig.cursor(), (2, 1));
}

#[test]
fn join_lines() {
    let mut rig = Rig::new();
    rig.seed("j.txt", b"foo \n  bar\n");
    rig.open("j.txt");
    rig.keys("J");
    assert_eq!(rig.line(1), "foo bar");
    assert_eq!(rig.ed.active_buffer().expect("buffer").line_count(), 1);
}

#[test]
fn yank_and_put_line() {
    let mut rig = Rig::new();
    rig.seed("p.txt", b"one\ntwo\nthree\n");
    rig.open("p.txt");
    rig.keys("jyy");
    assert_eq!(rig.ed.clipboard(), "two\r");
    rig.keys("p");
    assert_eq!(rig.line(3), "two");
    assert_eq!(rig.cursor(), (3, 1));
}

#[test]
fn dot_repeats_an_insert_sequence() {
    let mut rig = Rig::new();
    rig.open("i.txt");
    rig.keys("ihello\x1b");
    assert_eq!(rig.line(1), "hello");
    rig.keys(".");
    assert_eq!(rig.line(1), "hellohello");
}

#[test]
fn counted_insert_replays_at_escape() {
    let mut rig = Rig::new();
    rig.open("c.txt");
    rig.keys("3ihi\x1b");
    assert_eq!(rig.line(1), "hihihi");
}

#[test]
fn unknown_command_is_discarded_then_editor_still_works() {
    let mut rig = Rig::new();
    rig.seed("u.txt", b"ab\n");
    rig.open("u.txt");
    rig.keys("Zx");
    // 'Z' resolves Unknown and is dropped; 'x' still lands.
    assert_eq!(rig.line(1), "b");
}

#[test]
fn quit_refuses_on_unsaved_changes() {
    let mut rig = Rig::new();
    rig.seed("q.txt", b"ab\n");
    rig.open("q.txt");
    rig.keys("x");
    assert_eq!(rig.keys(":q\r"), Flow::Continue);
    // Message row of the strip carries the complaint.
    let msg = rig.term.row_text(24);
    assert!(msg.contains("No write"), "{msg:?}");
    assert_eq!(rig.keys(":q!\r"), Flow::Quit);
}

#[test]
fn x_command_writes_then_quits() {
    let mut rig = Rig::new();
    rig.seed("x.txt", b"ab\n");
    rig.open("x.txt");
    rig.keys("x");
    assert_eq!(rig.keys(":x\r"), Flow::Quit);
    assert_eq!(rig.file("x.txt"), b"b\n");
}

#[test]
fn wq_concatenation() {
    let mut rig = Rig::new();
    rig.seed("wq.txt", b"ab\n");
    rig.open("wq.txt");
    rig.keys("x");
    assert_eq!(rig.keys(":wq\r"), Flow::Quit);
    assert_eq!(rig.file("wq.txt"), b"b\n");
}

#[test]
fn write_to_existing_path_needs_bang() {
    let mut rig = Rig::new();
    rig.seed("a.txt", b"content\n");
    rig.seed("other.txt", b"old\n");
    rig.open("a.txt");
    assert_eq!(rig.keys(":w other.txt\r"), Flow::Continue);
    assert_eq!(rig.file("other.txt"), b"old\n");
    assert_eq!(rig.keys(":w! other.txt\r"), Flow::Continue);
    assert_eq!(rig.file("other.txt"), b"content\n");
}

#[test]
fn unknown_colon_command_reports() {
    let mut rig = Rig::new();
    rig.seed("z.txt", b"ab\n");
    rig.open("z.txt");
    assert_eq!(rig.keys(":zap\r"), Flow::Continue);
    let msg = rig.term.row_text(24);
    assert!(msg.contains("Unknown command"), "{msg:?}");
}

#[test]
fn command_line_echoes_in_strip() {
    let mut rig = Rig::new();
    rig.seed("e.txt", b"ab\n");
    rig.open("e.txt");
    rig.keys(":w");
    // Strip rows sit below the rows-3 editing split: 23 and 24 of 24.
    assert!(rig.term.row_text(23).starts_with(":w"), "{:?}", rig.term.row_text(23));
    rig.keys("\x08");
    assert!(rig.term.row_text(23).starts_with(": "), "{:?}", rig.term.row_text(23));
    rig.keys("\x1b");
    assert!(rig.term.row_text(23).starts_with(' '), "{:?}", rig.term.row_text(23));
    assert_eq!(rig.ed.mode(), core_keymap::Mode::Normal);
}

#[test]
fn ctrl_c_terminates() {
    let mut rig = Rig::new();
    rig.seed("t.txt", b"ab\n");
    rig.open("t.txt");
    assert_eq!(rig.ed.on_key(KeyCode::Ctrl('c'), &mut rig.term), Flow::Quit);
}

#[test]
fn normal_q_quits_clean_buffer_only() {
    let mut rig = Rig::new();
    rig.seed("n.txt", b"ab\n");
    rig.open("n.txt");
    assert_eq!(rig.keys("x"), Flow::Continue);
    assert_eq!(rig.keys("q"), Flow::Continue);
    assert_eq!(rig.keys(":w\r"), Flow::Continue);
    assert_eq!(rig.keys("q"), Flow::Quit);
}

#[test]
fn second_file_splits_vertically() {
    let mut rig = Rig::new();
    rig.seed("a.txt", b"aaa\n");
    rig.seed("b.txt", b"bbb\n");
    rig.open("a.txt");
    assert_eq!(rig.ed.curwid(), Wid(0xC000));
    rig.open("b.txt");
    assert_eq!(rig.ed.curwid(), Wid(0xC000).child_0());
    assert!(rig.ed.active_buffer().expect("buffer").filename().ends_with("b.txt"));
    // Both panes painted: left shows aaa, right shows bbb, separator between.
    let row1 = rig.term.row_text(1);
    assert!(row1.contains("aaa"), "{row1:?}");
    assert!(row1.contains("bbb"), "{row1:?}");
    assert!(row1.contains('\u{2502}'), "{row1:?}");
}

#[test]
fn plus_token_sets_initial_row() {
    let mut rig = Rig::new();
    rig.seed("big.txt", b"1\n2\n3\n4\n5\n");
    rig.open("big.txt");
    rig.ed.set_initial_row(4);
    rig.ed.repaint(&mut rig.term);
    assert_eq!(rig.cursor(), (4, 1));
}

#[test]
fn reopening_a_file_focuses_existing_window() {
    let mut rig = Rig::new();
    rig.seed("a.txt", b"aaa\n");
    rig.seed("b.txt", b"bbb\n");
    rig.open("a.txt");
    rig.open("b.txt");
    rig.open("a.txt");
    assert_eq!(rig.ed.curwid(), Wid(0xC000));
    assert!(rig.ed.active_buffer().expect("buffer").filename().ends_with("a.txt"));
}

#[test]
fn resize_reshapes_the_strip() {
    let mut rig = Rig::new();
    rig.seed("r.txt", b"ab\n");
    rig.open("r.txt");
    rig.term = GridTerminal::new(60, 16);
    rig.ed.on_resize(60, 16, &mut rig.term);
    rig.keys(":w");
    assert!(rig.term.row_text(15).starts_with(":w"));
}

#[test]
fn replace_mode_overwrites_via_keys() {
    let mut rig = Rig::new();
    rig.seed("R.txt", b"abcd\n");
    rig.open("R.txt");
    rig.keys("RXY\x1b");
    assert_eq!(rig.line(1), "XYcd");
}

#[test]
fn add_window_registers_each_wid_once() {
    let mut rig = Rig::new();
    rig.seed("a.txt", b"one\ntwo\n");
    rig.open("a.txt");
    // Already viewed through the editing region.
    assert!(!rig.ed.add_window("a.txt", Wid(0xC000)));
    assert!(rig.ed.add_window("a.txt", Wid(0x4000)));
    assert!(!rig.ed.add_window("a.txt", Wid(0x4000)));
    assert!(!rig.ed.add_window("missing.txt", Wid(0x4000)));
}

#[test]
fn sibling_views_refresh_on_line_count_change() {
    let mut rig = Rig::new();
    rig.seed("a.txt", b"one\ntwo\n");
    rig.open("a.txt");
    // Second view of the same buffer through the bottom strip.
    assert!(rig.ed.add_window("a.txt", Wid(0x4000)));
    rig.keys("dd");
    // The sibling was fully redrawn and shows the shifted first line.
    assert!(rig.term.row_text(23).starts_with("two"), "{:?}", rig.term.row_text(23));
}

#[test]
fn open_line_and_type() {
    let mut rig = Rig::new();
    rig.seed("o.txt", b"top\nbottom\n");
    rig.open("o.txt");
    rig.keys("omiddle\x1b");
    assert_eq!(rig.line(1), "top");
    assert_eq!(rig.line(2), "middle");
    assert_eq!(rig.line(3), "bottom");
}
