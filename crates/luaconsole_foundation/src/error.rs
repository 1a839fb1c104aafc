//! Error types for the Lua console.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for console operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for console operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a syntax error for a statement that needs more input.
    #[must_use]
    pub fn incomplete(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxIncomplete {
            message: message.into(),
        })
    }

    /// Creates a terminal syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
        })
    }

    /// Creates a runtime error. The message already carries any traceback.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime {
            message: message.into(),
        })
    }

    /// Creates an error for an evaluation aborted by the interrupt bridge.
    #[must_use]
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interrupted {
            message: message.into(),
        })
    }

    /// Creates a line editor error.
    #[must_use]
    pub fn editor(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Editor(message.into()))
    }

    /// Creates an I/O error tied to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io {
            path: path.into(),
            message: source.to_string(),
        })
    }

    /// Creates a command line usage error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage(message.into()))
    }

    /// Returns the text shown to the user when this error is reported.
    ///
    /// Errors raised by the script runtime are shown verbatim, the way the
    /// runtime itself formats them.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            ErrorKind::SyntaxIncomplete { message }
            | ErrorKind::Syntax { message }
            | ErrorKind::Runtime { message }
            | ErrorKind::Interrupted { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error only means the statement needs more lines.
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self.kind, ErrorKind::SyntaxIncomplete { .. })
    }

    /// Whether this error came from a cooperative interrupt.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self.kind, ErrorKind::Interrupted { .. })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The statement is syntactically incomplete and needs more input.
    #[error("incomplete statement: {message}")]
    SyntaxIncomplete {
        /// The compiler message, ending with the end-of-input marker.
        message: String,
    },

    /// The statement can never compile.
    #[error("syntax error: {message}")]
    Syntax {
        /// The compiler message.
        message: String,
    },

    /// The statement raised an error while running.
    #[error("runtime error: {message}")]
    Runtime {
        /// The error message followed by a traceback.
        message: String,
    },

    /// The statement was aborted by an interrupt request.
    #[error("interrupted: {message}")]
    Interrupted {
        /// The error message followed by a traceback.
        message: String,
    },

    /// The scripting runtime could not be created.
    #[error("cannot create state: {0}")]
    StateCreation(String),

    /// The line editor failed.
    #[error("line editor: {0}")]
    Editor(String),

    /// A file could not be read or written.
    #[error("cannot open {}: {message}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying failure.
        message: String,
    },

    /// A command line option was malformed.
    #[error("{0}")]
    Usage(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Chunk name of the code that failed.
    pub chunk: Option<String>,
    /// Number of lines the statement spanned.
    pub lines: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk name.
    #[must_use]
    pub fn with_chunk(mut self, chunk: impl Into<String>) -> Self {
        self.chunk = Some(chunk.into());
        self
    }

    /// Sets the number of source lines involved.
    #[must_use]
    pub const fn with_lines(mut self, lines: usize) -> Self {
        self.lines = Some(lines);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(chunk) = &self.chunk {
            write!(f, "in {chunk}")?;
        }
        if let Some(lines) = self.lines {
            write!(f, " ({lines} lines)")?;
        }
        Ok(())
    }
}
