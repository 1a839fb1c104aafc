//! Tab completion against the live global namespace.
//!
//! A partial word such as `string.fo` or `io.stdout:wr` is split at its last
//! `.` or `:`. The path before it is resolved from the global table, following
//! `__index` chains where a key is missing, and the entries of the resolved
//! node (and of its `__index` chain) whose names start with the remaining
//! text become candidates. Each candidate carries a suffix hinting at how the
//! name is used next.

use std::collections::HashSet;
use std::ffi::c_void;

use luaconsole_foundation::{KEYWORDS, is_valid_identifier};
use mlua::{Lua, Value};
use tracing::trace;

use crate::meta::{self, MAX_META_HOPS, NodeKind};

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The full replacement for the word being completed, without suffix.
    pub text: String,
    /// Usage hint appended after the text.
    pub suffix: char,
}

impl Candidate {
    /// The text to insert, suffix included.
    #[must_use]
    pub fn replacement(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 1);
        out.push_str(&self.text);
        out.push(self.suffix);
        out
    }
}

/// Candidates found by one completion request, plus their common prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    common_prefix: String,
    candidates: Vec<Candidate>,
}

impl CandidateList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate, narrowing the common prefix to fit it.
    pub fn push(&mut self, candidate: Candidate) {
        let replacement = candidate.replacement();
        if self.candidates.is_empty() {
            self.common_prefix = replacement;
        } else {
            let shared: usize = self
                .common_prefix
                .chars()
                .zip(replacement.chars())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| a.len_utf8())
                .sum();
            self.common_prefix.truncate(shared);
        }
        self.candidates.push(candidate);
    }

    /// The longest prefix shared by every candidate's replacement text.
    #[must_use]
    pub fn common_prefix(&self) -> &str {
        &self.common_prefix
    }

    /// The candidates, sorted by text.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Iterates over the candidates.
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no candidate was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Looks up a candidate by its text.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.text == text)
    }

    fn sort(&mut self) {
        self.candidates.sort_by(|a, b| a.text.cmp(&b.text));
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Resolves partial identifiers against a runtime's global namespace.
#[derive(Clone)]
pub struct CompletionEngine {
    lua: Lua,
}

impl CompletionEngine {
    /// Creates an engine reading the globals of `lua`.
    #[must_use]
    pub fn new(lua: &Lua) -> Self {
        meta::capture_raw_getmetatable(lua);
        Self { lua: lua.clone() }
    }

    /// Completes the word spanning `start..end` of `line`.
    ///
    /// Returns `None` if the span is not a valid range of `line`.
    #[must_use]
    pub fn complete(&self, line: &str, start: usize, end: usize) -> Option<CandidateList> {
        self.complete_word(line.get(start..end)?)
    }

    /// Completes a dotted or colon-qualified partial identifier.
    ///
    /// Returns `None` when the word does not start like an identifier, when
    /// part of its path cannot be resolved, or when nothing matches.
    #[must_use]
    pub fn complete_word(&self, word: &str) -> Option<CandidateList> {
        match word.chars().next() {
            None => {}
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            Some(_) => return None,
        }

        let (path, tail) = match word.rfind(['.', ':']) {
            Some(i) => (&word[..=i], &word[i + 1..]),
            None => ("", word),
        };

        let mut node = Value::Table(self.lua.globals());
        if !path.is_empty() {
            for segment in path[..path.len() - 1].split(['.', ':']) {
                node = lookup(&self.lua, &node, segment)?;
            }
        }

        let mut list = CandidateList::new();
        if path.is_empty() {
            for keyword in KEYWORDS.iter().filter(|kw| kw.starts_with(tail)) {
                list.push(Candidate {
                    text: (*keyword).to_string(),
                    suffix: ' ',
                });
            }
        }
        collect_entries(&self.lua, node, path, tail, &mut list);

        trace!(word, found = list.len(), "completion");
        if list.is_empty() {
            return None;
        }
        list.sort();
        Some(list)
    }
}

/// Looks up `key` in `node`, falling back along its `__index` chain.
fn lookup(lua: &Lua, node: &Value, key: &str) -> Option<Value> {
    let mut current = node.clone();
    for _ in 0..MAX_META_HOPS {
        if let Value::Table(table) = &current {
            let found: Value = table.raw_get(key).ok()?;
            if !found.is_nil() {
                return Some(found);
            }
        }
        current = meta::next_index(lua, &current)?;
    }
    None
}

/// Adds every matching entry of `node` and its `__index` chain to `list`.
///
/// Names reached through several hops are only offered once.
fn collect_entries(lua: &Lua, node: Value, path: &str, tail: &str, list: &mut CandidateList) {
    let mut visited: Vec<*const c_void> = Vec::new();
    let mut offered: HashSet<String> = HashSet::new();
    let mut current = Some(node);

    for _ in 0..MAX_META_HOPS {
        let Some(node) = current.take() else {
            break;
        };
        if let Value::Table(table) = &node {
            let ptr = node.to_pointer();
            if !visited.contains(&ptr) {
                visited.push(ptr);
                for pair in table.pairs::<Value, Value>() {
                    let Ok((Value::String(key), value)) = pair else {
                        continue;
                    };
                    let name = meta::text(&key);
                    if !matches_tail(&name, tail) || !offered.insert(name.clone()) {
                        continue;
                    }
                    list.push(Candidate {
                        text: format!("{path}{name}"),
                        suffix: NodeKind::of(lua, &value).completion_suffix(),
                    });
                }
            }
        }
        current = meta::next_index(lua, &node);
    }
}

/// Names starting with `_` are only offered when asked for explicitly.
fn matches_tail(name: &str, tail: &str) -> bool {
    name.starts_with(tail)
        && is_valid_identifier(name)
        && (!name.starts_with('_') || tail.starts_with('_'))
}
