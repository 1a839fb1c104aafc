//! Accumulates input lines into one complete statement.
//!
//! The first line is tried as an expression (`return <line>;`) so that a bare
//! value echoes. Failing that, it is compiled as a statement; while the
//! compiler reports that it ran into the end of input, continuation lines are
//! appended and compilation is retried. Completeness is decided only by the
//! compiler, never by counting brackets.

use luaconsole_foundation::{Error, ErrorContext, Result};
use mlua::{Function, Lua, Value};
use tracing::trace;

use crate::editor::{LineEditor, ReadResult};
use crate::meta;

/// Chunk name for interactive input.
pub const STDIN_CHUNK: &str = "=stdin";

/// Marker that ends the message of an error caused by running out of input.
pub const EOF_MARK: &str = "<eof>";

/// Prompt used when the global `_PROMPT` is unset.
pub const PRIMARY_PROMPT: &str = "$ ";

/// Prompt used when the global `_PROMPT2` is unset.
pub const CONTINUATION_PROMPT: &str = "$> ";

/// Outcome of reading one statement.
#[derive(Debug)]
pub enum Statement {
    /// A compiled statement, ready to run.
    Unit {
        /// The compiled chunk.
        function: Function,
        /// The source text that was compiled.
        source: String,
    },
    /// The statement cannot compile; the error says why.
    Abandoned(Error),
    /// The user cancelled the pending statement with Ctrl+C.
    Cancelled,
    /// No more input.
    EndOfInput,
}

/// Compiles `source` as a chunk named `chunk`.
///
/// # Errors
///
/// Returns [`Error::incomplete`] when the compiler ran out of input, or a
/// syntax error otherwise.
pub fn compile(lua: &Lua, source: &[u8], chunk: &str) -> Result<Function> {
    lua.load(source)
        .set_name(chunk)
        .into_function()
        .map_err(|err| {
            let error = match err {
                mlua::Error::SyntaxError {
                    message,
                    incomplete_input,
                } => {
                    if incomplete_input || message.ends_with(EOF_MARK) {
                        Error::incomplete(message)
                    } else {
                        Error::syntax(message)
                    }
                }
                other => Error::syntax(other.to_string()),
            };
            error.with_context(ErrorContext::new().with_chunk(chunk))
        })
}

/// Returns the prompt to show, honoring `_PROMPT` and `_PROMPT2`.
#[must_use]
pub fn prompt(lua: &Lua, first_line: bool) -> String {
    let (name, default) = if first_line {
        ("_PROMPT", PRIMARY_PROMPT)
    } else {
        ("_PROMPT2", CONTINUATION_PROMPT)
    };
    lua.globals()
        .get::<Value>(name)
        .ok()
        .and_then(|value| lua.coerce_string(value).ok().flatten())
        .map_or_else(|| default.to_string(), |s| meta::text(&s))
}

fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Reads one complete statement from `editor`.
///
/// A first line starting with `=` is read as `return <rest>`. Lines that
/// compiled are recorded in the editor's history as typed; a multi-line
/// statement is recorded as one entry.
///
/// # Errors
///
/// Returns an error only if the editor fails.
pub fn read_statement<E: LineEditor + ?Sized>(editor: &mut E, lua: &Lua) -> Result<Statement> {
    let line = match editor.read_line(&prompt(lua, true))? {
        ReadResult::Line(line) => strip_newline(line),
        ReadResult::Interrupted => return Ok(Statement::Cancelled),
        ReadResult::Eof => return Ok(Statement::EndOfInput),
    };

    let source = match line.strip_prefix('=') {
        Some(rest) => format!("return {rest}"),
        None => line.clone(),
    };

    let expression = format!("return {source};");
    if let Ok(function) = compile(lua, expression.as_bytes(), STDIN_CHUNK) {
        if !line.is_empty() {
            editor.add_history(&line);
        }
        return Ok(Statement::Unit {
            function,
            source: expression,
        });
    }

    let mut buffer = source;
    let mut typed = line;
    let mut lines = 1;
    loop {
        match compile(lua, buffer.as_bytes(), STDIN_CHUNK) {
            Ok(function) => {
                editor.add_history(&typed);
                return Ok(Statement::Unit {
                    function,
                    source: buffer,
                });
            }
            Err(err) if err.is_incomplete() => {
                trace!(lines, "statement incomplete, reading continuation");
                match editor.read_continuation(&prompt(lua, false))? {
                    ReadResult::Line(next) => {
                        let next = strip_newline(next);
                        buffer.push('\n');
                        buffer.push_str(&next);
                        typed.push('\n');
                        typed.push_str(&next);
                        lines += 1;
                    }
                    ReadResult::Interrupted => return Ok(Statement::Cancelled),
                    ReadResult::Eof => {
                        editor.add_history(&typed);
                        return Ok(Statement::Abandoned(
                            Error::syntax(err.message()).with_context(
                                ErrorContext::new()
                                    .with_chunk(STDIN_CHUNK)
                                    .with_lines(lines),
                            ),
                        ));
                    }
                }
            }
            Err(err) => {
                editor.add_history(&typed);
                return Ok(Statement::Abandoned(err));
            }
        }
    }
}
