//! Integration tests for the read-eval-print loop

use luaconsole_runtime::ReadResult;

use crate::support::{MockEditor, run_lines, run_repl, session};

// =============================================================================
// Expressions and Statements
// =============================================================================

#[test]
fn expression_result_is_printed() {
    let transcript = run_lines(&["1 + 2"]);
    assert_eq!(transcript.printed, ["3"]);
    assert!(transcript.errors.is_empty());
    assert_eq!(transcript.editor.continuations, 0);
}

#[test]
fn assignment_then_lookup() {
    let transcript = run_lines(&["greeting = 'hello'", "greeting .. ', world'"]);
    assert_eq!(transcript.printed, ["hello, world"]);
}

#[test]
fn function_call_statement_runs_once() {
    let transcript = run_lines(&["calls = 0", "function bump() calls = calls + 1 end", "bump()", "calls"]);
    assert_eq!(transcript.printed, ["1"]);
}

#[test]
fn for_loop_needs_two_continuations() {
    let transcript = run_lines(&["for i=1,3 do", "print(i)", "end"]);
    assert_eq!(transcript.printed, ["1", "2", "3"]);
    assert_eq!(transcript.editor.continuations, 2);
    assert_eq!(transcript.editor.prompts, ["$ ", "$> ", "$> ", "$ "]);
}

#[test]
fn unterminated_string_continues() {
    let transcript = run_lines(&["s = [[first", "second]]", "#s"]);
    assert_eq!(transcript.printed, ["12"]);
}

#[test]
fn equals_prefix_is_return() {
    let transcript = run_lines(&["=1, 2"]);
    assert_eq!(transcript.printed, ["1\t2"]);
}

#[test]
fn empty_line_prints_nothing() {
    let transcript = run_lines(&["", "   "]);
    assert!(transcript.printed.is_empty());
    assert!(transcript.errors.is_empty());
    assert_eq!(transcript.editor.history, ["   "]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn runtime_error_has_traceback_and_loop_continues() {
    let transcript = run_lines(&["error('boom')", "'still here'"]);
    assert!(
        transcript.errors.starts_with("stdin:1: boom\nstack traceback:"),
        "{}",
        transcript.errors
    );
    assert_eq!(transcript.printed, ["still here"]);
}

#[test]
fn syntax_error_has_no_traceback() {
    let transcript = run_lines(&["x = = 1", "'next'"]);
    assert!(transcript.errors.starts_with("stdin:1:"));
    assert!(!transcript.errors.contains("traceback"));
    assert_eq!(transcript.printed, ["next"]);
}

#[test]
fn error_object_with_tostring() {
    let transcript = run_lines(&[
        "err = setmetatable({}, { __tostring = function() return 'custom failure' end })",
        "error(err)",
    ]);
    assert!(transcript.errors.starts_with("custom failure"));
}

#[test]
fn error_object_without_tostring() {
    let transcript = run_lines(&["error({ code = 1 })"]);
    assert!(
        transcript
            .errors
            .starts_with("(error object is a table value)")
    );
}

#[test]
fn end_of_input_mid_statement_reports_eof() {
    let transcript = run_lines(&["function f()"]);
    assert!(transcript.errors.contains("<eof>"), "{}", transcript.errors);
}

#[test]
fn repl_reports_without_progname() {
    let (session, errors) = session();
    let session = session.with_progname("luaconsole");
    let transcript = run_repl(session, &errors, MockEditor::new(&["error('x', 0)"]));
    assert!(transcript.errors.starts_with("x\n"), "{}", transcript.errors);
}

// =============================================================================
// Prompts, History and Cancellation
// =============================================================================

#[test]
fn prompts_follow_globals() {
    let transcript = run_lines(&["_PROMPT = 'lua> '", "_PROMPT2 = '.. '", "do", "end"]);
    assert_eq!(
        transcript.editor.prompts,
        ["$ ", "lua> ", "lua> ", ".. ", "lua> "]
    );
}

#[test]
fn multi_line_history_is_one_entry() {
    let transcript = run_lines(&["if true then", "  x = 1", "end", "x"]);
    assert_eq!(transcript.editor.history, ["if true then\n  x = 1\nend", "x"]);
}

#[test]
fn ctrl_c_abandons_pending_statement() {
    let (session, errors) = session();
    let editor = MockEditor::with_results(vec![
        ReadResult::Line("while true do".into()),
        ReadResult::Interrupted,
        ReadResult::Line("'fresh'".into()),
    ]);
    let transcript = run_repl(session, &errors, editor);
    assert_eq!(transcript.printed, ["fresh"]);
    assert!(transcript.errors.is_empty());
}

#[test]
fn failing_print_is_reported() {
    let transcript = run_lines(&["print = function() error('no output', 0) end", "1"]);
    assert_eq!(transcript.errors, "error calling 'print' (no output)\n");
}
