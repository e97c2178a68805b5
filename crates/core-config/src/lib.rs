//! Editor settings: scroll margins and tab width.
//!
//! Settings come from `tvi.toml`, looked up in the working directory first
//! and then the platform config dir. Missing or unparsable files fall back
//! to defaults so startup never blocks on configuration. Margins are
//! re-clamped against the visible window so a tiny screen cannot make the
//! two scroll-off bands overlap.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "tvi.toml";

#[derive(Debug, Deserialize, Clone, Copy)]
struct ScrollSection {
    #[serde(default = "defaults::scrolloff")]
    off: u16,
    #[serde(default = "defaults::sidescrolloff")]
    sideoff: u16,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct EditorSection {
    #[serde(default = "defaults::tabstop")]
    tabstop: u16,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
struct ConfigFile {
    scroll: Option<ScrollSection>,
    editor: Option<EditorSection>,
}

mod defaults {
    pub fn scrolloff() -> u16 {
        2
    }
    pub fn sidescrolloff() -> u16 {
        5
    }
    pub fn tabstop() -> u16 {
        4
    }
}

/// Effective settings consumed by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Rows of context kept above/below the cursor.
    pub scrolloff: u16,
    /// Columns of context kept left/right of the cursor.
    pub sidescrolloff: u16,
    /// Tab width; 0 disables Tab expansion.
    pub tabstop: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scrolloff: defaults::scrolloff(),
            sidescrolloff: defaults::sidescrolloff(),
            tabstop: defaults::tabstop(),
        }
    }
}

impl Settings {
    /// Cap both margins to the window so opposite bands never meet.
    pub fn clamp_to(&mut self, rows: u16, cols: u16) {
        let row_cap = rows.saturating_sub(1) / 2;
        let col_cap = cols.saturating_sub(1) / 2;
        if self.scrolloff > row_cap || self.sidescrolloff > col_cap {
            debug!(
                target: "config",
                scrolloff = self.scrolloff,
                sidescrolloff = self.sidescrolloff,
                row_cap,
                col_cap,
                "margins_clamped"
            );
        }
        self.scrolloff = self.scrolloff.min(row_cap);
        self.sidescrolloff = self.sidescrolloff.min(col_cap);
    }
}

/// Best-effort config path: working directory first, then the platform
/// config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tvi").join(CONFIG_FILE);
    }
    local
}

/// Load settings from `path` (or the discovered location). Parse errors are
/// logged and yield defaults.
pub fn load_from(path: Option<PathBuf>) -> Settings {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Settings::default();
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let scroll = file.scroll;
            let editor = file.editor;
            let settings = Settings {
                scrolloff: scroll.map_or_else(defaults::scrolloff, |s| s.off),
                sidescrolloff: scroll.map_or_else(defaults::sidescrolloff, |s| s.sideoff),
                tabstop: editor.map_or_else(defaults::tabstop, |e| e.tabstop),
            };
            info!(target: "config", file = %path.display(), ?settings, "config_loaded");
            settings
        }
        Err(e) => {
            info!(target: "config", file = %path.display(), %e, "config_parse_failed_using_defaults");
            Settings::default()
        }
    }
}
