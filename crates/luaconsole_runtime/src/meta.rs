//! Raw metatable access over live runtime values.
//!
//! Everything here reads metatables directly and never invokes
//! metamethods, so it is safe to call while the user is typing.

use mlua::{Function, Lua, Table, Value};
use tracing::debug;

/// Maximum number of `__index` hops followed before giving up.
pub const MAX_META_HOPS: usize = 20;

/// Registry key holding the debug library's own `getmetatable`.
const RAW_GETMETATABLE_KEY: &str = "luaconsole.getmetatable";

/// The kinds of node found in the live namespace graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A table, indexable by string keys.
    Table,
    /// Anything callable as a function.
    Function,
    /// Host or library userdata.
    Userdata {
        /// Whether the userdata carries a metatable (method-call convention).
        has_metatable: bool,
    },
    /// Strings, numbers, booleans and everything else.
    Opaque,
}

impl NodeKind {
    /// Classifies a runtime value.
    #[must_use]
    pub fn of(lua: &Lua, value: &Value) -> Self {
        match value {
            Value::Table(_) => Self::Table,
            Value::Function(_) => Self::Function,
            Value::UserData(ud) => Self::Userdata {
                has_metatable: ud.metatable().is_ok() || foreign_metatable(lua, value).is_some(),
            },
            _ => Self::Opaque,
        }
    }

    /// The character appended to a completed name of this kind.
    ///
    /// Tables get `.` since there is no way to tell whether `:` is meant.
    #[must_use]
    pub const fn completion_suffix(self) -> char {
        match self {
            Self::Table => '.',
            Self::Function => '(',
            Self::Userdata {
                has_metatable: true,
            } => ':',
            Self::Userdata { .. } | Self::Opaque => ' ',
        }
    }
}

/// Stashes the debug library's `getmetatable` in the registry.
///
/// Later reassignments of the `debug` global do not change what
/// [`metafield`] uses. Only the native function is kept; a runtime without
/// the debug library cannot see metatables of foreign userdata.
pub fn capture_raw_getmetatable(lua: &Lua) {
    if let Ok(Some(_)) = lua.named_registry_value::<Option<Function>>(RAW_GETMETATABLE_KEY) {
        return;
    }
    let native = lua
        .globals()
        .raw_get::<Option<Table>>("debug")
        .ok()
        .flatten()
        .and_then(|debug| debug.raw_get::<Option<Function>>("getmetatable").ok().flatten())
        .filter(|f| f.info().what == "C");
    if let Some(getmetatable) = native {
        if let Err(e) = lua.set_named_registry_value(RAW_GETMETATABLE_KEY, getmetatable) {
            debug!(error = %e, "cannot stash getmetatable");
        }
    }
}

/// Metatable of userdata created outside this binding (file handles and
/// other library objects), read through the stashed native `getmetatable`.
fn foreign_metatable(lua: &Lua, value: &Value) -> Option<Table> {
    lua.named_registry_value::<Option<Function>>(RAW_GETMETATABLE_KEY)
        .ok()
        .flatten()?
        .call::<Option<Table>>(value.clone())
        .ok()
        .flatten()
}

/// Reads `field` from the metatable of `value`.
///
/// Returns `None` when there is no metatable or the field is nil.
#[must_use]
pub fn metafield(lua: &Lua, value: &Value, field: &str) -> Option<Value> {
    let found = match value {
        Value::Table(table) => table.metatable()?.raw_get::<Value>(field).ok()?,
        Value::UserData(ud) => match ud.metatable() {
            Ok(metatable) => metatable.get::<Value>(field).ok()?,
            Err(_) => foreign_metatable(lua, value)?
                .raw_get::<Value>(field)
                .ok()?,
        },
        _ => return None,
    };
    (!found.is_nil()).then_some(found)
}

/// Follows one step of the `__index` chain of `value`.
///
/// Returns `None` at the end of the chain, or when `__index` points back at
/// the value itself.
#[must_use]
pub fn next_index(lua: &Lua, value: &Value) -> Option<Value> {
    let next = metafield(lua, value, "__index")?;
    (!same_node(&next, value)).then_some(next)
}

/// Raw identity comparison between two reference values.
#[must_use]
pub fn same_node(a: &Value, b: &Value) -> bool {
    let pa = a.to_pointer();
    !pa.is_null() && pa == b.to_pointer()
}

/// Converts a runtime string to owned text, replacing invalid UTF-8.
#[must_use]
pub fn text(s: &mlua::String) -> String {
    s.to_string_lossy().into()
}
