//! The main REPL implementation.

use std::path::PathBuf;

use crate::config::ConsoleConfig;
use crate::editor::{LineEditor, RustylineEditor};
use crate::session::Session;
use crate::statement::{self, Statement};
use luaconsole_foundation::Result;
use tracing::{debug, warn};

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Session state (runtime, evaluator, error output).
    session: Session,

    /// Where history is loaded from and saved to.
    history_file: Option<PathBuf>,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(session: Session, config: &ConsoleConfig) -> Result<Self> {
        let editor = RustylineEditor::new(session.lua(), config.history_size)?;
        Ok(Self::with_editor(editor, session).with_history_file(config.history_file.clone()))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor.
    pub fn with_editor(editor: E, session: Session) -> Self {
        Self {
            editor,
            session,
            history_file: None,
        }
    }

    /// Sets the history file.
    #[must_use]
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Gives back the editor and the session.
    #[must_use]
    pub fn into_parts(self) -> (E, Session) {
        (self.editor, self.session)
    }

    /// Returns a reference to the editor.
    #[must_use]
    pub const fn editor(&self) -> &E {
        &self.editor
    }

    /// Runs the REPL loop until input ends.
    ///
    /// Errors are reported without the program name while the loop runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor fails.
    pub fn run(&mut self) -> Result<()> {
        let progname = self.session.set_progname(None);

        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.load_history(path) {
                warn!(error = %e, "cannot load history");
            }
        }

        let outcome = loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        println!();
        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                warn!(error = %e, "cannot save history");
            }
        }
        self.session.set_progname(progname);
        outcome
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` when input has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor fails.
    pub fn read_eval_print(&mut self) -> Result<bool> {
        match statement::read_statement(&mut self.editor, self.session.lua())? {
            Statement::EndOfInput => Ok(false),
            Statement::Cancelled => {
                println!();
                Ok(true)
            }
            Statement::Abandoned(err) => {
                self.session.report(&err);
                Ok(true)
            }
            Statement::Unit { function, source } => {
                match self.session.evaluate(&function) {
                    Ok(values) => {
                        debug!(results = values.len(), "statement evaluated");
                        self.session.print_values(values);
                    }
                    Err(err) => {
                        debug!(source = %source, "statement failed");
                        self.session.report(&err);
                    }
                }
                Ok(true)
            }
        }
    }
}
