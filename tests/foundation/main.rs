//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Error, ErrorContext, and the language lexicon.

mod errors;
