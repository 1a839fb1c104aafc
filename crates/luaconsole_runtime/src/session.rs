//! Session state shared by the command line and the REPL.
//!
//! The session owns the scripting runtime, the protected evaluator, and the
//! stream errors are reported to. Everything that runs user code goes
//! through [`Session::evaluator`], so every call is protected and
//! interruptible.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use luaconsole_foundation::{Error, ErrorContext, ErrorKind, Result};
use mlua::{Function, Lua, LuaOptions, MultiValue, StdLib, Value};
use tracing::debug;

use crate::config::InitCode;
use crate::evaluator::{Evaluator, runtime_error_text};
use crate::meta;
use crate::statement::{self, STDIN_CHUNK};

/// Program name used when none is given on the command line.
pub const DEFAULT_PROGNAME: &str = "lua";

/// Chunk name for code given with `-e`.
pub const COMMAND_LINE_CHUNK: &str = "=(command line)";

/// Registry flag read by `package` when it sets its search paths.
const NOENV_KEY: &str = "LUA_NOENV";

const COPYRIGHT: &str = "Copyright (C) 1994-2024 Lua.org, PUC-Rio";

/// A scripting runtime together with how its errors are reported.
pub struct Session {
    lua: Lua,
    evaluator: Evaluator,
    progname: Option<String>,
    errors: Box<dyn Write>,
}

impl Session {
    /// Creates a session with every standard library open.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::StateCreation`] if the runtime cannot be set up.
    pub fn new() -> Result<Self> {
        Self::new_with(false)
    }

    /// Creates a session, optionally telling libraries to ignore the
    /// environment.
    ///
    /// The `LUA_NOENV` registry flag is set before any library is opened,
    /// so `package` does not pick up `LUA_PATH` or `LUA_CPATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::StateCreation`] if the runtime cannot be set up.
    pub fn new_with(ignore_env: bool) -> Result<Self> {
        let to_error = |e: mlua::Error| Error::new(ErrorKind::StateCreation(runtime_error_text(&e)));
        // SAFETY: the console is a stand-alone interpreter, so user code gets
        // the `debug` library like it would anywhere else.
        let lua = unsafe { Lua::unsafe_new_with(StdLib::NONE, LuaOptions::default()) };
        if ignore_env {
            lua.set_named_registry_value(NOENV_KEY, true)
                .map_err(to_error)?;
        }
        lua.load_std_libs(StdLib::ALL).map_err(to_error)?;
        debug!(ignore_env, "session created");
        Self::with_lua(lua)
    }

    /// Creates a session around an existing runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::StateCreation`] if the evaluator cannot be built.
    pub fn with_lua(lua: Lua) -> Result<Self> {
        meta::capture_raw_getmetatable(&lua);
        let evaluator = Evaluator::new(&lua)?;
        Ok(Self {
            lua,
            evaluator,
            progname: Some(DEFAULT_PROGNAME.to_string()),
            errors: Box::new(io::stderr()),
        })
    }

    /// Sets the program name that prefixes reports.
    #[must_use]
    pub fn with_progname(mut self, progname: impl Into<String>) -> Self {
        self.progname = Some(progname.into());
        self
    }

    /// Sends reports to `output` instead of stderr.
    #[must_use]
    pub fn with_error_output(mut self, output: impl Write + 'static) -> Self {
        self.errors = Box::new(output);
        self
    }

    /// Replaces the program name, returning the previous one.
    pub fn set_progname(&mut self, progname: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.progname, progname)
    }

    /// Returns the program name, if reports are prefixed.
    #[must_use]
    pub fn progname(&self) -> Option<&str> {
        self.progname.as_deref()
    }

    /// Returns the scripting runtime.
    #[must_use]
    pub const fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Returns the protected evaluator.
    #[must_use]
    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Returns the version banner.
    #[must_use]
    pub fn version(&self) -> String {
        let version = self
            .lua
            .globals()
            .get::<String>("_VERSION")
            .unwrap_or_else(|_| "Lua 5.4".to_string());
        format!("{version}  {COPYRIGHT}")
    }

    /// Writes a report for `error`, prefixed with the program name if set.
    pub fn report(&mut self, error: &Error) {
        let message = error.message();
        let written = match &self.progname {
            Some(progname) => writeln!(self.errors, "{progname}: {message}"),
            None => writeln!(self.errors, "{message}"),
        };
        if written.and_then(|()| self.errors.flush()).is_err() {
            debug!("error report could not be written");
        }
    }

    /// Whether libraries were told to ignore the environment.
    #[must_use]
    pub fn ignores_env(&self) -> bool {
        self.lua
            .named_registry_value::<bool>(NOENV_KEY)
            .unwrap_or(false)
    }

    /// Creates the global `arg` table.
    ///
    /// `script` is the index of the script in `argv`. The script lands at
    /// index 0, its arguments at positive indices, and everything before it
    /// at negative indices. Without a script the interpreter name is at 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    pub fn create_arg_table(&self, argv: &[String], script: Option<usize>) -> Result<()> {
        let to_error = |e: mlua::Error| Error::runtime(runtime_error_text(&e));
        let base = script.filter(|&i| i < argv.len()).unwrap_or(0);
        let table = self.lua.create_table().map_err(to_error)?;
        for (i, arg) in argv.iter().enumerate() {
            let index = i64::try_from(i).unwrap_or(i64::MAX) - i64::try_from(base).unwrap_or(0);
            table.raw_set(index, arg.as_str()).map_err(to_error)?;
        }
        self.lua.globals().set("arg", table).map_err(to_error)
    }

    /// Compiles and runs `code` under `chunk`.
    ///
    /// # Errors
    ///
    /// Returns the syntax or runtime error the code raised.
    pub fn run_string(&self, code: &str, chunk: &str) -> Result<()> {
        let function = statement::compile(&self.lua, code.as_bytes(), chunk)?;
        self.evaluator.evaluate(&function).map(drop)
    }

    /// Runs the file at `path`, or stdin when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its code fails.
    pub fn run_file(&self, path: Option<&Path>) -> Result<()> {
        let function = self.load_file(path)?;
        self.evaluator.evaluate(&function).map(drop)
    }

    /// Runs the main script, passing `arg[1..#arg]` as its arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be loaded, `arg` is not a
    /// table, or the script fails.
    pub fn run_script(&self, path: Option<&Path>) -> Result<()> {
        let function = self.load_file(path)?;
        let args = self.script_args()?;
        self.evaluator.call(&function, args).map(drop)
    }

    /// Runs `require(name)` and stores the result in the global `name`.
    ///
    /// # Errors
    ///
    /// Returns the error raised while loading the library.
    pub fn run_library(&self, name: &str) -> Result<()> {
        let globals = self.lua.globals();
        let require: Function = globals
            .get("require")
            .map_err(|e| Error::runtime(runtime_error_text(&e)))?;
        let args: MultiValue = std::iter::once(Value::String(
            self.lua
                .create_string(name)
                .map_err(|e| Error::runtime(runtime_error_text(&e)))?,
        ))
        .collect();
        let module = self
            .evaluator
            .call(&require, args)?
            .into_iter()
            .next()
            .unwrap_or(Value::Nil);
        globals
            .set(name, module)
            .map_err(|e| Error::runtime(runtime_error_text(&e)))
    }

    /// Runs startup code from the environment.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the startup code.
    pub fn run_init(&self, init: &InitCode) -> Result<()> {
        match init {
            InitCode::File(path) => self.run_file(Some(path)),
            InitCode::Source { chunk, code } => self.run_string(code, chunk),
        }
    }

    /// Evaluates `unit` as a protected call.
    ///
    /// # Errors
    ///
    /// Returns the runtime or interrupted error raised by `unit`.
    pub fn evaluate(&self, unit: &Function) -> Result<MultiValue> {
        self.evaluator.evaluate(unit)
    }

    /// Passes `values` to the global `print`, reporting any failure.
    ///
    /// Nothing is printed when `values` is empty.
    pub fn print_values(&mut self, values: MultiValue) {
        if values.is_empty() {
            return;
        }
        let outcome = match self.lua.globals().get::<Value>("print") {
            Ok(Value::Function(print)) => print.call::<()>(values),
            Ok(other) => Err(mlua::Error::runtime(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            let text = runtime_error_text(&e);
            let message = format!("error calling 'print' ({})", without_traceback(&text));
            self.report(&Error::runtime(message));
        }
    }

    fn load_file(&self, path: Option<&Path>) -> Result<Function> {
        let (source, chunk) = match path {
            Some(path) => {
                let source = fs::read(path).map_err(|e| Error::io(path, &e))?;
                (source, format!("@{}", path.display()))
            }
            None => {
                let mut source = Vec::new();
                io::stdin()
                    .read_to_end(&mut source)
                    .map_err(|e| Error::io("stdin", &e))?;
                (source, STDIN_CHUNK.to_string())
            }
        };
        statement::compile(&self.lua, skip_shebang(&source), &chunk).map_err(|err| {
            match err.kind {
                // A whole file has no more input to wait for.
                ErrorKind::SyntaxIncomplete { message } => Error::syntax(message)
                    .with_context(ErrorContext::new().with_chunk(chunk.as_str())),
                _ => err,
            }
        })
    }

    fn script_args(&self) -> Result<MultiValue> {
        let to_error = |e: mlua::Error| Error::runtime(runtime_error_text(&e));
        let Ok(Value::Table(arg)) = self.lua.globals().get::<Value>("arg") else {
            return Err(Error::runtime("'arg' is not a table"));
        };
        let count = arg.raw_len();
        (1..=count)
            .map(|i| arg.raw_get::<Value>(i).map_err(to_error))
            .collect()
    }
}

/// Drops the traceback the runtime appends to errors from unprotected calls.
fn without_traceback(message: &str) -> &str {
    message
        .split_once("\nstack traceback:")
        .map_or(message, |(head, _)| head)
}

/// Blanks out a leading `#` line, keeping its newline so line numbers hold.
fn skip_shebang(source: &[u8]) -> &[u8] {
    if source.first() != Some(&b'#') {
        return source;
    }
    let newline = source
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(source.len());
    &source[newline..]
}
