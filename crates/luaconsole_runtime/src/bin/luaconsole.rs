//! Lua console CLI entry point.

use std::env;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use luaconsole_foundation::Result;
use luaconsole_runtime::cli::{self, Action, CliOptions};
use luaconsole_runtime::session::{COMMAND_LINE_CHUNK, DEFAULT_PROGNAME};
use luaconsole_runtime::{ConsoleConfig, Repl, Session, logger};
use tracing::debug;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let progname = args
        .first()
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_PROGNAME.to_string());

    let options = match cli::parse(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{progname}: {}", e.message());
            eprint!("{}", cli::usage(&progname));
            return ExitCode::FAILURE;
        }
    };

    let config = if options.ignore_env {
        ConsoleConfig::from_env().without_env()
    } else {
        ConsoleConfig::from_env()
    };
    logger::init(config.log_level);
    debug!(?options, "command line parsed");

    let session = match Session::new_with(options.ignore_env) {
        Ok(session) => session.with_progname(progname.as_str()),
        Err(e) => {
            eprintln!("{progname}: {}", e.message());
            return ExitCode::FAILURE;
        }
    };

    if run(session, &args, &options, &config) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Reports `result` through the session; true if it succeeded.
fn check(session: &mut Session, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            session.report(&e);
            false
        }
    }
}

fn run(mut session: Session, args: &[String], options: &CliOptions, config: &ConsoleConfig) -> bool {
    if options.show_version {
        println!("{}", session.version());
    }

    let result = session.create_arg_table(args, options.script);
    if !check(&mut session, result) {
        return false;
    }

    if let Some(init) = &config.init {
        let result = session.run_init(init);
        if !check(&mut session, result) {
            return false;
        }
    }

    for action in &options.actions {
        let result = match action {
            Action::Execute(code) => session.run_string(code, COMMAND_LINE_CHUNK),
            Action::Library(name) => session.run_library(name),
        };
        if !check(&mut session, result) {
            return false;
        }
    }

    if let Some(index) = options.script {
        let path = (!options.script_is_stdin).then(|| Path::new(args[index].as_str()));
        let result = session.run_script(path);
        if !check(&mut session, result) {
            return false;
        }
    }

    if options.interactive {
        return run_repl(session, config);
    }
    if options.is_bare() {
        if io::stdin().is_terminal() {
            println!("{}", session.version());
            return run_repl(session, config);
        }
        let result = session.run_file(None);
        return check(&mut session, result);
    }
    true
}

fn run_repl(session: Session, config: &ConsoleConfig) -> bool {
    let progname = session.progname().unwrap_or(DEFAULT_PROGNAME).to_string();
    let outcome = Repl::new(session, config).and_then(|mut repl| repl.run());
    match outcome {
        Ok(()) => true,
        Err(e) => {
            eprintln!("{progname}: {}", e.message());
            false
        }
    }
}
