//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use luaconsole_foundation::{Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_incomplete() {
    let err = Error::incomplete("stdin:1: 'end' expected near <eof>");
    assert!(matches!(err.kind, ErrorKind::SyntaxIncomplete { .. }));
    assert!(err.is_incomplete());
    assert!(!err.is_interrupted());
}

#[test]
fn error_syntax() {
    let err = Error::syntax("stdin:1: unexpected symbol near '='");
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
    assert!(!err.is_incomplete());
}

#[test]
fn error_runtime() {
    let err = Error::runtime("stdin:1: boom");
    assert!(matches!(err.kind, ErrorKind::Runtime { .. }));
}

#[test]
fn error_interrupted() {
    let err = Error::interrupted("interrupted!");
    assert!(err.is_interrupted());
}

#[test]
fn error_usage() {
    let err = Error::usage("unrecognized option '-x'");
    assert!(matches!(err.kind, ErrorKind::Usage(_)));
}

// =============================================================================
// Error Display
// =============================================================================

#[test]
fn display_names_kind() {
    assert!(format!("{}", Error::syntax("bad")).starts_with("syntax error:"));
    assert!(format!("{}", Error::runtime("bad")).starts_with("runtime error:"));
    assert!(format!("{}", Error::editor("tty")).contains("tty"));
    assert!(format!("{}", Error::new(ErrorKind::StateCreation("oom".into()))).contains("oom"));
}

#[test]
fn message_is_raw_for_script_errors() {
    let traceback = "stdin:1: boom\nstack traceback:\n\t[C]: in function 'error'";
    assert_eq!(Error::runtime(traceback).message(), traceback);
    assert_eq!(Error::syntax("stdin:1: x").message(), "stdin:1: x");
}

#[test]
fn message_for_other_kinds_uses_display() {
    let err = Error::new(ErrorKind::StateCreation("not enough memory".into()));
    assert_eq!(err.message(), "cannot create state: not enough memory");
    assert_eq!(Error::usage("'-e' needs argument").message(), "'-e' needs argument");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_is_optional() {
    let err = Error::runtime("x");
    assert!(err.context.is_none());
}

#[test]
fn context_records_chunk() {
    let err = Error::syntax("x").with_context(ErrorContext::new().with_chunk("=stdin"));
    let ctx = err.context.expect("context");
    assert_eq!(ctx.chunk.as_deref(), Some("=stdin"));
    assert_eq!(ctx.lines, None);
    assert_eq!(ctx.to_string(), "in =stdin");
}
