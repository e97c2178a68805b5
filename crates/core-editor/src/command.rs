//! Command-line evaluation: `w`, `x`, `q`, concatenated, each optionally
//! followed by `!` and/or a path. A path argument (introduced by a space)
//! consumes the rest of the input, so `wq` chains but `w notes.txt` takes a
//! file name. Failures report to the status strip and never terminate.

use std::path::{Path, PathBuf};

use core_terminal::Terminal;
use core_text::SaveOutcome;
use tracing::info;

use crate::{Editor, Flow};

impl Editor {
    pub(crate) fn eval_command(&mut self, term: &mut dyn Terminal) -> Flow {
        let input = self.scmd.trim().to_string();
        if input.is_empty() {
            return Flow::Continue;
        }
        info!(target: "command", cmd = %input, "execute");
        let mut flow = Flow::Continue;
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            let force = matches!(chars.peek(), Some(&'!'));
            if force {
                chars.next();
            }
            let mut path: Option<String> = None;
            if matches!(chars.peek(), Some(ch) if ch.is_whitespace()) {
                let rest: String = chars.by_ref().collect();
                let rest = rest.trim();
                if !rest.is_empty() {
                    path = Some(rest.to_string());
                }
            }
            match c {
                'w' => {
                    if !self.write_active(path.as_deref(), force, term) {
                        return Flow::Continue;
                    }
                }
                'x' => {
                    if self.write_active(path.as_deref(), force, term) {
                        flow = Flow::Quit;
                    } else {
                        return Flow::Continue;
                    }
                }
                'q' => match self.request_quit(force, term) {
                    Flow::Quit => flow = Flow::Quit,
                    Flow::Continue => return Flow::Continue,
                },
                other => {
                    self.report(term, &format!("Unknown command: {other}"), false);
                    return Flow::Continue;
                }
            }
        }
        flow
    }

    /// Save the active buffer, reporting any refusal or failure. Returns
    /// true only when the file hit the disk.
    fn write_active(&mut self, path: Option<&str>, force: bool, term: &mut dyn Terminal) -> bool {
        let target: Option<PathBuf> = path.map(|p| {
            if Path::new(p).is_absolute() {
                PathBuf::from(p)
            } else {
                self.cwd.join(p)
            }
        });
        let curwid = self.curwid;
        let outcome = self
            .buffers
            .values_mut()
            .find(|b| b.views.contains_key(&curwid))
            .map(|open| open.buff.save(target.as_deref(), force));
        match outcome {
            None => {
                self.report(term, "No buffer to write", false);
                false
            }
            Some(SaveOutcome::Written) => true,
            Some(SaveOutcome::Refused) => {
                self.report(term, "File exists (add ! to overwrite)", false);
                false
            }
            Some(SaveOutcome::NoFilename) => {
                self.report(term, "No file name", false);
                false
            }
            Some(SaveOutcome::Failed) => {
                self.report(term, "Write failed", false);
                false
            }
        }
    }
}
