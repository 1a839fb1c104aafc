//! Command line options.
//!
//! Options are handled until the first argument that is not one; that
//! argument names the script and everything after it belongs to the script.

use luaconsole_foundation::{Error, Result};

/// Code to run before the script, in command line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `-e stat`: run a string.
    Execute(String),
    /// `-l name`: require a library into a global.
    Library(String),
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Index of the script in the argument list, if there is one.
    pub script: Option<usize>,
    /// Whether the script is stdin (`-`).
    pub script_is_stdin: bool,
    /// `-i`: enter the REPL after the script.
    pub interactive: bool,
    /// `-v` (or `-i`): print version information.
    pub show_version: bool,
    /// Whether any `-e` was given.
    pub execute: bool,
    /// `-E`: ignore environment variables.
    pub ignore_env: bool,
    /// `-e` and `-l` actions, in order.
    pub actions: Vec<Action>,
}

impl CliOptions {
    /// Whether there was nothing to do but start the console.
    #[must_use]
    pub const fn is_bare(&self) -> bool {
        self.script.is_none() && !self.interactive && !self.execute && !self.show_version
    }
}

/// Parses `args`, where `args[0]` is the program name.
///
/// # Errors
///
/// Returns a usage error naming the offending option.
pub fn parse(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut i = 1;

    while i < args.len() {
        let arg = args[i].as_str();
        let Some(flag) = arg.strip_prefix('-') else {
            options.script = Some(i);
            return Ok(options);
        };

        match flag.chars().next() {
            None => {
                options.script = Some(i);
                options.script_is_stdin = true;
                return Ok(options);
            }
            Some('-') => {
                if flag.len() > 1 {
                    return Err(unrecognized(arg));
                }
                if i + 1 < args.len() {
                    options.script = Some(i + 1);
                }
                return Ok(options);
            }
            Some('E') if flag.len() == 1 => options.ignore_env = true,
            Some('i') if flag.len() == 1 => {
                options.interactive = true;
                options.show_version = true;
            }
            Some('v') if flag.len() == 1 => options.show_version = true,
            Some(option @ ('e' | 'l')) => {
                let value = if flag.len() > 1 {
                    flag[1..].to_string()
                } else {
                    i += 1;
                    match args.get(i) {
                        Some(next) if !next.starts_with('-') => next.clone(),
                        _ => return Err(Error::usage(format!("'{arg}' needs argument"))),
                    }
                };
                if option == 'e' {
                    options.execute = true;
                    options.actions.push(Action::Execute(value));
                } else {
                    options.actions.push(Action::Library(value));
                }
            }
            Some(_) => return Err(unrecognized(arg)),
        }
        i += 1;
    }

    Ok(options)
}

fn unrecognized(arg: &str) -> Error {
    Error::usage(format!("unrecognized option '{arg}'"))
}

/// Returns the usage text.
#[must_use]
pub fn usage(progname: &str) -> String {
    format!(
        "usage: {progname} [options] [script [args]]
Available options are:
  -e stat  execute string 'stat'
  -i       enter interactive mode after executing 'script'
  -l name  require library 'name' into global 'name'
  -v       show version information
  -E       ignore environment variables
  --       stop handling options
  -        stop handling options and execute stdin
"
    )
}
