//! Shared helpers for the console tests.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use luaconsole_foundation::Result;
use luaconsole_runtime::{LineEditor, ReadResult, Repl, Session};
use mlua::Table;

/// Scripted line source.
pub struct MockEditor {
    inputs: Vec<ReadResult>,
    index: usize,
    pub continuations: usize,
    pub prompts: Vec<String>,
    pub history: Vec<String>,
}

impl MockEditor {
    pub fn new(inputs: &[&str]) -> Self {
        Self::with_results(
            inputs
                .iter()
                .map(|line| ReadResult::Line((*line).to_string()))
                .collect(),
        )
    }

    pub fn with_results(inputs: Vec<ReadResult>) -> Self {
        Self {
            inputs,
            index: 0,
            continuations: 0,
            prompts: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl LineEditor for MockEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        self.prompts.push(prompt.to_string());
        if self.index < self.inputs.len() {
            let next = std::mem::replace(&mut self.inputs[self.index], ReadResult::Eof);
            self.index += 1;
            Ok(next)
        } else {
            Ok(ReadResult::Eof)
        }
    }

    fn read_continuation(&mut self, prompt: &str) -> Result<ReadResult> {
        self.continuations += 1;
        self.read_line(prompt)
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}

/// A writer whose contents can be read back after being moved into a session.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replaces the global `print` with one that records its lines in `printed`.
const CAPTURE_PRINT: &str = "
    printed = {}
    print = function(...)
        local t = table.pack(...)
        for i = 1, t.n do t[i] = tostring(t[i]) end
        printed[#printed + 1] = table.concat(t, '\\t', 1, t.n)
    end";

/// Creates a session with captured `print` and error output.
pub fn session() -> (Session, SharedBuffer) {
    let errors = SharedBuffer::default();
    let session = Session::new()
        .expect("session")
        .with_error_output(errors.clone());
    session
        .run_string(CAPTURE_PRINT, "=capture")
        .expect("capture print");
    (session, errors)
}

/// Lines recorded by the captured `print`.
pub fn printed(session: &Session) -> Vec<String> {
    let printed: Table = session.lua().globals().get("printed").expect("printed");
    printed
        .sequence_values::<String>()
        .collect::<mlua::Result<Vec<_>>>()
        .expect("printed lines")
}

/// Outcome of running the REPL over scripted input.
pub struct Transcript {
    pub printed: Vec<String>,
    pub errors: String,
    pub editor: MockEditor,
}

/// Runs the REPL over `session` until `editor` runs dry.
pub fn run_repl(session: Session, errors: &SharedBuffer, editor: MockEditor) -> Transcript {
    let mut repl = Repl::with_editor(editor, session);
    repl.run().expect("repl");
    let printed = printed(repl.session());
    let (editor, _) = repl.into_parts();
    Transcript {
        printed,
        errors: errors.contents(),
        editor,
    }
}

/// Runs the REPL over scripted lines with a fresh session.
pub fn run_lines(lines: &[&str]) -> Transcript {
    let (session, errors) = session();
    run_repl(session, &errors, MockEditor::new(lines))
}
