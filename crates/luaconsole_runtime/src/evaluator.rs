//! Protected evaluation of compiled chunks.
//!
//! Every call goes through the base library's `xpcall` with a message
//! handler that runs at the failure point, before the stack unwinds. The
//! handler turns the error payload into text and appends a traceback, so the
//! traceback points at where the error was raised.

use std::cell::Cell;
use std::iter;
use std::rc::Rc;

use luaconsole_foundation::{Error, ErrorKind, Result};
use mlua::{Function, Lua, MultiValue, Table, Value};
use tracing::debug;

use crate::interrupt;
use crate::meta::{self, metafield};

/// Traceback level that skips the traceback function and the handler itself.
const TRACEBACK_LEVEL: i32 = 2;

/// Runs compiled units as protected calls.
pub struct Evaluator {
    lua: Lua,
    xpcall: Function,
    handler: Function,
    /// Whether the last payload seen by the handler was an abort.
    interrupted: Rc<Cell<bool>>,
}

impl Evaluator {
    /// Creates an evaluator for `lua`.
    ///
    /// The base library's `xpcall` and `debug.traceback` are captured now,
    /// so later changes to those globals do not affect evaluation.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime lacks `xpcall` or the message handler
    /// cannot be created.
    pub fn new(lua: &Lua) -> Result<Self> {
        let globals = lua.globals();
        let xpcall: Function = globals.get("xpcall").map_err(|e| {
            Error::new(ErrorKind::StateCreation(format!(
                "base library has no xpcall: {e}"
            )))
        })?;
        let traceback = globals
            .get::<Option<Table>>("debug")
            .ok()
            .flatten()
            .and_then(|debug| debug.get::<Option<Function>>("traceback").ok().flatten());

        let interrupted = Rc::new(Cell::new(false));
        let seen = Rc::clone(&interrupted);
        let handler = lua
            .create_function(move |lua, payload: Value| {
                seen.set(is_abort(&payload));
                Ok(message_handler(lua, &payload, traceback.as_ref()))
            })
            .map_err(|e| Error::new(ErrorKind::StateCreation(e.to_string())))?;

        Ok(Self {
            lua: lua.clone(),
            xpcall,
            handler,
            interrupted,
        })
    }

    /// Evaluates `unit` with no arguments.
    ///
    /// # Errors
    ///
    /// Returns a runtime or interrupted error carrying the formatted message.
    pub fn evaluate(&self, unit: &Function) -> Result<MultiValue> {
        self.call(unit, MultiValue::new())
    }

    /// Calls `unit` with `args` as a protected call.
    ///
    /// The interrupt bridge is armed for exactly the duration of the call.
    ///
    /// # Errors
    ///
    /// Returns a runtime or interrupted error carrying the formatted message.
    pub fn call(&self, unit: &Function, args: MultiValue) -> Result<MultiValue> {
        let call_args: MultiValue = iter::once(Value::Function(unit.clone()))
            .chain(iter::once(Value::Function(self.handler.clone())))
            .chain(args)
            .collect();

        let armed = interrupt::arm(&self.lua);
        let outcome = self.xpcall.call::<MultiValue>(call_args);
        drop(armed);

        let mut values = outcome
            .map_err(|e| Error::runtime(runtime_error_text(&e)))?
            .into_iter();
        match values.next() {
            Some(Value::Boolean(true)) => Ok(values.collect()),
            _ => {
                let message = values.next().map_or_else(
                    || describe_object(&self.lua, &Value::Nil),
                    |v| describe_payload(&self.lua, &v),
                );
                let interrupted = self.interrupted.replace(false);
                debug!(interrupted, "evaluation failed");
                if interrupted {
                    Err(Error::interrupted(message))
                } else {
                    Err(Error::runtime(message))
                }
            }
        }
    }
}

/// Whether `payload` is the error raised by the interrupt checkpoint.
///
/// A script that catches the abort and raises something else is not
/// reported as interrupted.
fn is_abort(payload: &Value) -> bool {
    matches!(payload, Value::Error(err) if runtime_error_text(err) == interrupt::INTERRUPTED_MESSAGE)
}

/// The message handler: describe the payload, then append a traceback.
fn message_handler(lua: &Lua, payload: &Value, traceback: Option<&Function>) -> String {
    let message = describe_payload(lua, payload);
    traceback
        .and_then(|tb| {
            tb.call::<String>((message.clone(), TRACEBACK_LEVEL))
                .ok()
        })
        .unwrap_or(message)
}

/// Renders an error payload as text.
///
/// Strings and numbers are used as they are; errors raised from the host
/// side yield their message; other objects go through `__tostring`.
#[must_use]
pub fn describe_payload(lua: &Lua, payload: &Value) -> String {
    match payload {
        Value::String(_) | Value::Integer(_) | Value::Number(_) => lua
            .coerce_string(payload.clone())
            .ok()
            .flatten()
            .map_or_else(|| describe_object(lua, payload), |s| meta::text(&s)),
        Value::Error(err) => runtime_error_text(err),
        other => describe_object(lua, other),
    }
}

/// Uses a `__tostring` metamethod that yields a string, or names the type.
fn describe_object(lua: &Lua, value: &Value) -> String {
    if let Some(Value::Function(tostring)) = metafield(lua, value, "__tostring") {
        if let Ok(Value::String(s)) = tostring.call::<Value>(value.clone()) {
            return meta::text(&s);
        }
    }
    format!("(error object is a {} value)", value.type_name())
}

/// Extracts the message of a host-side runtime error.
#[must_use]
pub fn runtime_error_text(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::CallbackError { cause, .. } => runtime_error_text(cause),
        other => other.to_string(),
    }
}
