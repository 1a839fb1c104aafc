//! Console configuration read from the process environment.

use std::env;
use std::path::PathBuf;

use crate::logger::LogLevel;

/// Versioned variable holding code to run at startup.
pub const LUA_INIT_5_4: &str = "LUA_INIT_5_4";
/// Unversioned fallback for [`LUA_INIT_5_4`].
pub const LUA_INIT: &str = "LUA_INIT";
/// History file for the REPL.
pub const LUA_HISTORY: &str = "LUA_HISTORY";
/// Maximum number of history entries.
pub const LUA_HISTSIZE: &str = "LUA_HISTSIZE";
/// Diagnostic log level.
pub const LUACONSOLE_LOG: &str = "LUACONSOLE_LOG";

/// Code to run before anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitCode {
    /// Run the named file (`@path`).
    File(PathBuf),
    /// Run this source with the given chunk name.
    Source {
        /// Chunk name, `=` followed by the variable name.
        chunk: String,
        /// The code itself.
        code: String,
    },
}

/// Settings for one console run.
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfig {
    /// Startup code, if any.
    pub init: Option<InitCode>,
    /// Where history is loaded from and saved to.
    pub history_file: Option<PathBuf>,
    /// Limit on history entries.
    pub history_size: Option<usize>,
    /// Level for diagnostics on stderr.
    pub log_level: LogLevel,
}

impl ConsoleConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let init = [LUA_INIT_5_4, LUA_INIT].into_iter().find_map(|name| {
            lookup(name).map(|value| match value.strip_prefix('@') {
                Some(path) => InitCode::File(PathBuf::from(path)),
                None => InitCode::Source {
                    chunk: format!("={name}"),
                    code: value,
                },
            })
        });

        let history_file = lookup(LUA_HISTORY)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let history_size = lookup(LUA_HISTSIZE)
            .and_then(|size| size.trim().parse::<usize>().ok())
            .filter(|&size| size > 0);

        let log_level = lookup(LUACONSOLE_LOG)
            .and_then(|level| level.parse().ok())
            .unwrap_or_default();

        Self {
            init,
            history_file,
            history_size,
            log_level,
        }
    }

    /// Drops everything taken from `LUA_*` variables. The log level stays.
    #[must_use]
    pub fn without_env(self) -> Self {
        Self {
            log_level: self.log_level,
            ..Self::default()
        }
    }
}
