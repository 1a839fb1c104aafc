//! Integration tests for turning Ctrl-C into an `interrupted!` error

use luaconsole_runtime::interrupt::{self, BridgeState};

use crate::support::{MockEditor, run_repl, session};

/// Installs `request_abort()` as a global that asks for an abort from inside
/// the running evaluation.
fn install_request(session: &luaconsole_runtime::Session) {
    let request = session
        .lua()
        .create_function(|_, ()| Ok(interrupt::request_abort()))
        .unwrap();
    session.lua().globals().set("request_abort", request).unwrap();
}

#[test]
fn infinite_loop_is_interrupted_and_repl_continues() {
    let (session, errors) = session();
    install_request(&session);
    let transcript = run_repl(
        session,
        &errors,
        MockEditor::new(&["request_abort() while true do end", "'alive'"]),
    );
    assert!(
        transcript.errors.starts_with("interrupted!"),
        "{}",
        transcript.errors
    );
    assert!(transcript.errors.contains("stack traceback:"));
    assert_eq!(transcript.printed, ["alive"]);
}

#[test]
fn request_outside_loop_does_not_leak() {
    let (session, errors) = session();
    install_request(&session);
    let transcript = run_repl(
        session,
        &errors,
        MockEditor::new(&[
            "granted = request_abort()",
            "local n = 0 for i = 1, 100000 do n = n + i end total = n",
            "total",
        ]),
    );
    assert_eq!(transcript.printed, ["5000050000"]);
    assert!(transcript.errors.is_empty(), "{}", transcript.errors);
}

#[test]
fn bridge_is_armed_during_evaluation() {
    let (session, errors) = session();
    let observed = session
        .lua()
        .create_function(|_, ()| Ok(interrupt::state() == BridgeState::Armed))
        .unwrap();
    session.lua().globals().set("armed", observed).unwrap();
    let transcript = run_repl(session, &errors, MockEditor::new(&["armed()"]));
    assert_eq!(transcript.printed, ["true"]);
}

#[cfg(unix)]
#[test]
fn real_sigint_interrupts_evaluation() {
    use signal_hook::consts::SIGINT;

    let (session, errors) = session();
    let raise = session
        .lua()
        .create_function(|_, ()| {
            signal_hook::low_level::raise(SIGINT).map_err(mlua::Error::external)
        })
        .unwrap();
    session.lua().globals().set("raise_sigint", raise).unwrap();

    let transcript = run_repl(
        session,
        &errors,
        MockEditor::new(&["raise_sigint() while true do end", "1 + 1"]),
    );
    assert!(
        transcript.errors.starts_with("interrupted!"),
        "{}",
        transcript.errors
    );
    assert_eq!(transcript.printed, ["2"]);
}
