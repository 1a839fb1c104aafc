//! Luaconsole - Interactive Lua console
//!
//! This crate re-exports all layers of the console for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: luaconsole_runtime    - REPL, evaluator, interrupts, completion, CLI
//! Layer 0: luaconsole_foundation - Errors and the language lexicon
//! ```

pub use luaconsole_foundation as foundation;
pub use luaconsole_runtime as runtime;
