//! Integration tests for namespace completion

use luaconsole_runtime::CompletionEngine;
use proptest::prelude::*;

use crate::support::session;

fn replacements(engine: &CompletionEngine, word: &str) -> Vec<String> {
    engine
        .complete_word(word)
        .map(|list| list.iter().map(|c| c.replacement()).collect())
        .unwrap_or_default()
}

// =============================================================================
// Standard Library
// =============================================================================

#[test]
fn library_tables_complete_with_dot() {
    let (session, _) = session();
    let engine = CompletionEngine::new(session.lua());
    assert!(replacements(&engine, "stri").contains(&"string.".to_string()));
    assert!(replacements(&engine, "string.for").contains(&"string.format(".to_string()));
}

#[test]
fn method_completion_on_file_handle() {
    let (session, _) = session();
    let engine = CompletionEngine::new(session.lua());
    assert_eq!(replacements(&engine, "io.std"), ["io.stderr:", "io.stdin:", "io.stdout:"]);
    assert!(replacements(&engine, "io.stdout:wr").contains(&"io.stdout:write(".to_string()));
}

#[test]
fn keywords_only_at_top_level() {
    let (session, _) = session();
    let engine = CompletionEngine::new(session.lua());
    assert!(replacements(&engine, "fun").contains(&"function ".to_string()));
    session.run_string("t = { functional = true }", "=setup").unwrap();
    assert_eq!(replacements(&engine, "t.fun"), ["t.functional "]);
}

#[test]
fn completion_sees_new_globals() {
    let (session, _) = session();
    let engine = CompletionEngine::new(session.lua());
    assert!(engine.complete_word("zebra_").is_none());
    session.run_string("zebra_count = 1", "=setup").unwrap();
    assert_eq!(replacements(&engine, "zebra_"), ["zebra_count "]);
}

// =============================================================================
// Metatables
// =============================================================================

#[test]
fn class_style_objects_offer_inherited_methods() {
    let (session, _) = session();
    session
        .run_string(
            "Animal = {} Animal.__index = Animal
             function Animal.speak() end
             Dog = setmetatable({}, { __index = Animal }) Dog.__index = Dog
             function Dog.fetch() end
             rex = setmetatable({ name = 'rex' }, Dog)",
            "=setup",
        )
        .unwrap();
    let engine = CompletionEngine::new(session.lua());
    assert_eq!(
        replacements(&engine, "rex:"),
        ["rex:fetch(", "rex:name ", "rex:speak("]
    );
}

#[test]
fn index_functions_are_not_called() {
    let (session, _) = session();
    session
        .run_string(
            "calls = 0
             lazy = setmetatable({}, { __index = function() calls = calls + 1 end })",
            "=setup",
        )
        .unwrap();
    let engine = CompletionEngine::new(session.lua());
    assert!(engine.complete_word("lazy.x").is_none());
    assert!(engine.complete_word("lazy.deep.x").is_none());
    assert_eq!(session.lua().globals().get::<i64>("calls").unwrap(), 0);
}

#[test]
fn replaced_metatable_getters_are_not_called() {
    let (session, _) = session();
    session
        .run_string(
            "calls = 0
             debug.getmetatable = function() calls = calls + 1 return nil end
             getmetatable = function() calls = calls + 1 while true do end end",
            "=setup",
        )
        .unwrap();
    let engine = CompletionEngine::new(session.lua());
    assert_eq!(replacements(&engine, "io.std"), ["io.stderr:", "io.stdin:", "io.stdout:"]);
    assert_eq!(session.lua().globals().get::<i64>("calls").unwrap(), 0);
}

#[test]
fn cyclic_index_chain_terminates() {
    let (session, _) = session();
    session
        .run_string(
            "a = { from_a = 1 } b = { from_b = 2 }
             setmetatable(a, { __index = b }) setmetatable(b, { __index = a })",
            "=setup",
        )
        .unwrap();
    let engine = CompletionEngine::new(session.lua());
    assert_eq!(replacements(&engine, "a.from"), ["a.from_a ", "a.from_b "]);
    assert!(engine.complete_word("a.missing.x").is_none());
}

// =============================================================================
// Common Prefix Invariant
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn common_prefix_is_longest_shared_prefix(
        names in proptest::collection::hash_set("[a-z][a-z0-9_]{0,6}", 1..16)
    ) {
        let (session, _) = session();
        let table = session.lua().create_table().unwrap();
        for name in &names {
            table.set(name.as_str(), 1).unwrap();
        }
        session.lua().globals().set("pt", table).unwrap();

        let engine = CompletionEngine::new(session.lua());
        let list = engine.complete_word("pt.").expect("candidates");
        prop_assert_eq!(list.len(), names.len());

        let prefix = list.common_prefix();
        let texts: Vec<String> = list.iter().map(|c| c.replacement()).collect();
        for text in &texts {
            prop_assert!(text.starts_with(prefix));
        }
        if texts.len() > 1 {
            let longer = |c: char| texts.iter().all(|t| t[prefix.len()..].starts_with(c));
            let next = texts[0][prefix.len()..].chars().next();
            prop_assert!(next.is_none_or(|c| !longer(c)));
        } else {
            prop_assert_eq!(prefix, texts[0].as_str());
        }
    }
}
