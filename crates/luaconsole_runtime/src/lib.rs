//! REPL, completion, interrupt handling and CLI for the Lua console.
//!
//! This crate provides:
//! - [`Repl`] - Interactive read-eval-print loop
//! - [`statement`] - Accumulating lines into complete statements
//! - [`Evaluator`] - Protected calls with tracebacks
//! - [`interrupt`] - Turning Ctrl-C into a cooperative abort
//! - [`CompletionEngine`] - Tab completion against the live global table
//! - CLI argument parsing, configuration and logging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod completion;
pub mod config;
pub mod editor;
pub mod evaluator;
pub mod highlight;
pub mod interrupt;
pub mod logger;
pub mod meta;
pub mod repl;
pub mod session;
pub mod statement;

pub use cli::{Action, CliOptions};
pub use completion::{Candidate, CandidateList, CompletionEngine};
pub use config::{ConsoleConfig, InitCode};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use evaluator::Evaluator;
pub use highlight::LuaHighlighter;
pub use logger::LogLevel;
pub use repl::Repl;
pub use session::Session;
pub use statement::Statement;
