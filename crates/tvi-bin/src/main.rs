//! tvi entrypoint: argument handling, file logging, terminal setup, and the
//! blocking key loop. The editor owns the terminal, so diagnostics go to
//! `tvi.log` (filtered by `RUST_LOG`), never to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use core_editor::{Editor, Flow};
use core_terminal::{CrosstermTerminal, KeyCode};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{error, info};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tvi", version, about = "Modal text editor for serial terminals")]
struct Args {
    /// Files to open; a `+N` token positions the cursor at line N in the
    /// most recently opened file. Tokens apply left to right.
    #[arg(value_name = "ARG")]
    args: Vec<String>,
    /// Configuration file path (overrides discovery of `tvi.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Fresh append-only log per run, non-blocking writer.
    let log_path = std::path::Path::new("tvi.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(log_path);
    }
    let appender = tracing_appender::rolling::never(".", "tvi.log");
    let (writer, _log_guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    info!(target: "runtime", "startup");

    // Log panics before the terminal Drop restores the screen.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!(target: "runtime.panic", ?info, "panic");
        default_panic(info);
    }));

    let args = Args::parse();
    let settings = core_config::load_from(args.config.clone());
    let cwd = std::env::current_dir().context("resolve working directory")?;

    let mut term = CrosstermTerminal::new()?;
    term.enter()?;

    let mut editor = Editor::new(&term, settings, cwd);
    let mut opened_any = false;
    for token in &args.args {
        if let Some(rest) = token.strip_prefix('+')
            && let Ok(n) = rest.parse::<u32>()
        {
            editor.set_initial_row(n);
        } else {
            editor.open(token, &mut term);
            opened_any = true;
        }
    }
    if !opened_any {
        editor.open_scratch();
    }
    editor.repaint(&mut term);

    loop {
        match event::read().context("read terminal event")? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if let Some(code) = map_key(key)
                    && editor.on_key(code, &mut term) == Flow::Quit
                {
                    break;
                }
            }
            Event::Resize(cols, rows) => {
                term.set_size(cols, rows);
                editor.on_resize(cols, rows, &mut term);
            }
            _ => {}
        }
    }
    info!(target: "runtime", "shutdown");
    Ok(())
}

/// Map a crossterm key event onto the editor's normalized key codes.
fn map_key(key: KeyEvent) -> Option<KeyCode> {
    use crossterm::event::KeyCode as Ct;
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && let Ct::Char(c) = key.code
    {
        return Some(KeyCode::Ctrl(c.to_ascii_lowercase()));
    }
    Some(match key.code {
        Ct::Char(c) => KeyCode::Char(c),
        Ct::Enter => KeyCode::Enter,
        Ct::Esc => KeyCode::Esc,
        Ct::Backspace => KeyCode::Backspace,
        Ct::Delete => KeyCode::Delete,
        Ct::Tab => KeyCode::Tab,
        Ct::Home => KeyCode::Home,
        Ct::End => KeyCode::End,
        Ct::Up => KeyCode::Up,
        Ct::Down => KeyCode::Down,
        Ct::Left => KeyCode::Left,
        Ct::Right => KeyCode::Right,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: crossterm::event::KeyCode, mods: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn control_chords_normalize_to_lowercase() {
        use crossterm::event::KeyCode as Ct;
        assert_eq!(
            map_key(press(Ct::Char('L'), KeyModifiers::CONTROL)),
            Some(KeyCode::Ctrl('l'))
        );
        assert_eq!(
            map_key(press(Ct::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyCode::Ctrl('c'))
        );
    }

    #[test]
    fn plain_keys_pass_through() {
        use crossterm::event::KeyCode as Ct;
        assert_eq!(
            map_key(press(Ct::Char('x'), KeyModifiers::NONE)),
            Some(KeyCode::Char('x'))
        );
        assert_eq!(map_key(press(Ct::Esc, KeyModifiers::NONE)), Some(KeyCode::Esc));
        assert_eq!(map_key(press(Ct::F(1), KeyModifiers::NONE)), None);
    }
}
