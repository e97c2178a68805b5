//! Modal command resolution.
//!
//! Normal-mode commands are a flat, comma-separated table of key strings
//! paired 1:1 with [`Action`] variants by position; `:` separates aliases
//! that share one action (`0` and `^` both reach line start). The table and
//! the enum are generated from a single macro invocation so they cannot
//! drift. Resolution is a byte-wise two-pointer walk that reports strict
//! prefixes as [`Resolution::Unterminated`] so the dispatcher keeps
//! accumulating keystrokes.

use tracing::trace;

/// Editor modes. The numeric values matter: bit 1 marks the edit modes, so
/// `INSERT | REPLACE` can be tested with one mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Normal = 0,
    Command = 1,
    Insert = 2,
    Replace = 3,
}

const EDIT_MODE: u8 = 2;

impl Mode {
    /// True in INSERT and REPLACE.
    pub fn is_edit(self) -> bool {
        self as u8 & EDIT_MODE != 0
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
            Mode::Insert => "INSERT",
            Mode::Replace => "REPLACE",
        }
    }
}

macro_rules! command_table {
    ( $first:ident => $first_keys:literal $(, $name:ident => $keys:literal )* $(,)? ) => {
        /// One resolved editing command. Variant order is the table order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Action {
            $first $(, $name)*
        }

        /// The resolver table, index-paired with [`Action`].
        pub const COMMANDS: &str = concat!($first_keys $(, ",", $keys)*);

        const ACTIONS: &[Action] = &[Action::$first $(, Action::$name)*];
    };
}

command_table! {
    Insert => "i",
    Append => "a",
    Replace => "R",
    Join => "J",
    Change => "C",
    ChangeWord => "cw",
    Delete => "x",
    PutAfter => "p",
    PutBefore => "P",
    Undo => "U",
    Repeat => ".",
    OpenLine => "o",
    MoveLeft => "h",
    MoveDown => "j",
    MoveUp => "k",
    MoveRight => "l",
    NextWord => "w",
    PrevWord => "b",
    MoveLineEnd => "$",
    MoveDocEnd => "G",
    CopyLine => "yy",
    CopyWord => "yw",
    DeleteLine => "dd",
    DeleteWord => "dw",
    DeleteTo => "dt",
    Quit => "q",
    MoveLineBegin => "0:^",
    SearchNext => "n",
}

/// Outcome of matching an accumulated key string against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Action(Action),
    /// Strict prefix of at least one entry: keep accumulating.
    Unterminated,
    /// No entry can complete this string: discard it.
    Unknown,
}

/// Longest-prefix match of `needle` against the command table.
pub fn resolve(needle: &str) -> Resolution {
    if needle.is_empty() {
        return Resolution::Unterminated;
    }
    let table = COMMANDS.as_bytes();
    let nb = needle.as_bytes();
    let mut idx = 0usize;
    let mut i = 0usize;
    while i < table.len() {
        let mut t = i;
        let mut n = 0usize;
        while t < table.len()
            && table[t] != b','
            && table[t] != b':'
            && n < nb.len()
            && table[t] == nb[n]
        {
            t += 1;
            n += 1;
        }
        let alias_ended = t >= table.len() || table[t] == b',' || table[t] == b':';
        if n == nb.len() {
            if alias_ended {
                trace!(target: "input.resolve", cmd = needle, index = idx, "resolved");
                return Resolution::Action(ACTIONS[idx]);
            }
            return Resolution::Unterminated;
        }
        while t < table.len() && table[t] != b',' && table[t] != b':' {
            t += 1;
        }
        if t < table.len() && table[t] == b':' {
            i = t + 1;
        } else {
            i = t + 1;
            idx += 1;
        }
    }
    Resolution::Unknown
}
