//! Error types and language lexicon for the Lua console.
//!
//! This crate provides:
//! - [`Error`] - Rich error types with context
//! - [`lexicon`] - Reserved words and identifier rules shared by completion
//!   and highlighting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod lexicon;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use lexicon::{KEYWORDS, is_identifier_char, is_keyword, is_valid_identifier};
