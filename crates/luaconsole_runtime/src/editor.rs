//! Line editor abstraction for the REPL.
//!
//! This module provides a trait-based abstraction over line editing libraries,
//! allowing the REPL to use rustyline while remaining swappable.

use std::borrow::Cow;
use std::path::Path;

use crate::completion::CompletionEngine;
use crate::highlight::LuaHighlighter;
use luaconsole_foundation::{Error, Result};
use mlua::Lua;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::{
    Completer, CompletionType, Config, Context, Editor, Helper, Hinter, Validator,
};
use tracing::debug;

/// Characters that end a word for completion. `.` and `:` are not among
/// them, so qualified names complete as a whole.
const WORD_BREAKS: &str = "\t\r\n !\"#$%&'()*+,-/;<=>?@[\\]^`{|}~";

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was successfully read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D (EOF).
    Eof,
}

/// Abstraction over line editing functionality.
///
/// This trait allows swapping out the underlying line editor implementation
/// (e.g., from rustyline to reedline) without changing the REPL code.
pub trait LineEditor {
    /// Read a line with the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Read a continuation line (for multi-line input).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the terminal fails.
    fn read_continuation(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Add a line to history.
    fn add_history(&mut self, line: &str);

    /// Load history from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn load_history(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Save history to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save_history(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Helper for rustyline that provides completion, hints and highlighting.
#[derive(Helper, Completer, Hinter, Validator)]
struct ConsoleHelper {
    #[rustyline(Completer)]
    completer: NamespaceCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    highlighter: LuaHighlighter,
}

impl Highlighter for ConsoleHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completer backed by the live global namespace.
struct NamespaceCompleter {
    engine: CompletionEngine,
}

/// Start of the word ending at `pos`.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| WORD_BREAKS.contains(c))
        .map_or(0, |i| i + 1)
}

impl Completer for NamespaceCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let Some(list) = self.engine.complete(line, start, pos) else {
            return Ok((pos, Vec::new()));
        };

        // Fill in the unambiguous part first.
        let prefix = list.common_prefix();
        if list.len() > 1 && prefix.len() > pos - start {
            return Ok((
                start,
                vec![Pair {
                    display: prefix.to_string(),
                    replacement: prefix.to_string(),
                }],
            ));
        }

        let candidates = list
            .iter()
            .map(|c| Pair {
                display: c.replacement(),
                replacement: c.replacement(),
            })
            .collect();
        Ok((start, candidates))
    }
}

/// Line editor implementation using rustyline.
pub struct RustylineEditor {
    editor: Editor<ConsoleHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a new rustyline-based editor completing against `lua`.
    ///
    /// `history_size` limits the number of remembered entries.
    ///
    /// # Errors
    ///
    /// Returns an error if rustyline initialization fails.
    pub fn new(lua: &Lua, history_size: Option<usize>) -> Result<Self> {
        let mut builder = Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List);
        if let Some(size) = history_size {
            builder = builder
                .max_history_size(size)
                .map_err(|e| Error::editor(e.to_string()))?;
        }

        let helper = ConsoleHelper {
            completer: NamespaceCompleter {
                engine: CompletionEngine::new(lua),
            },
            hinter: HistoryHinter::new(),
            highlighter: LuaHighlighter::new(),
        };

        let mut editor =
            Editor::with_config(builder.build()).map_err(|e| Error::editor(e.to_string()))?;
        editor.set_helper(Some(helper));

        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::editor(e.to_string())),
        }
    }

    fn read_continuation(&mut self, prompt: &str) -> Result<ReadResult> {
        self.read_line(prompt)
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!(error = %e, "history entry dropped");
        }
    }

    fn load_history(&mut self, path: &Path) -> Result<()> {
        self.editor
            .load_history(path)
            .map_err(|e| Error::editor(format!("{}: {e}", path.display())))
    }

    fn save_history(&mut self, path: &Path) -> Result<()> {
        self.editor
            .save_history(path)
            .map_err(|e| Error::editor(format!("{}: {e}", path.display())))
    }
}
