//! Syntax highlighting for the REPL.

use std::borrow::Cow;

use luaconsole_foundation::{is_identifier_char, is_keyword};

const RESET: &str = "\x1b[0m";
const COMMENT: &str = "\x1b[2;3m";
const STRING: &str = "\x1b[33m";
const NUMBER: &str = "\x1b[35m";
const KEYWORD: &str = "\x1b[32m";
const CONSTANT: &str = "\x1b[34m";

/// Highlighter for Lua source lines.
pub struct LuaHighlighter {}

impl LuaHighlighter {
    /// Creates a new highlighter.
    pub const fn new() -> Self {
        Self {}
    }

    /// Highlight a line of input.
    #[allow(clippy::unused_self)]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                // Comments run to the end of the line
                '-' if chars.peek() == Some(&'-') => {
                    result.push_str(COMMENT);
                    result.push(c);
                    result.extend(chars.by_ref());
                    result.push_str(RESET);
                }

                // Quoted strings
                '"' | '\'' => {
                    result.push_str(STRING);
                    result.push(c);
                    while let Some(next) = chars.next() {
                        result.push(next);
                        if next == '\\' {
                            if let Some(escaped) = chars.next() {
                                result.push(escaped);
                            }
                        } else if next == c {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                // Long strings: [[ ... ]] and [==[ ... ]==]
                '[' if matches!(chars.peek(), Some('[' | '=')) => {
                    let mut opener = String::from('[');
                    while let Some(&'=') = chars.peek() {
                        opener.push('=');
                        chars.next();
                    }
                    if chars.peek() == Some(&'[') {
                        chars.next();
                        opener.push('[');
                        let closer: String = opener
                            .chars()
                            .map(|ch| if ch == '[' { ']' } else { ch })
                            .collect();
                        result.push_str(STRING);
                        result.push_str(&opener);
                        let mut body = String::new();
                        for next in chars.by_ref() {
                            body.push(next);
                            if body.ends_with(&closer) {
                                break;
                            }
                        }
                        result.push_str(&body);
                        result.push_str(RESET);
                    } else {
                        result.push_str(&opener);
                    }
                }

                // Numbers, including hex and exponents
                c if c.is_ascii_digit() => {
                    result.push_str(NUMBER);
                    result.push(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_hexdigit() || matches!(next, '.' | 'x' | 'X' | 'p' | 'P')
                        {
                            result.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    result.push_str(RESET);
                }

                // Identifiers and keywords
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(&next) = chars.peek() {
                        if is_identifier_char(next) {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }

                    let color = match word.as_str() {
                        "nil" | "true" | "false" => CONSTANT,
                        w if is_keyword(w) => KEYWORD,
                        _ => "",
                    };

                    if color.is_empty() {
                        result.push_str(&word);
                    } else {
                        result.push_str(color);
                        result.push_str(&word);
                        result.push_str(RESET);
                    }
                }

                _ => result.push(c),
            }
        }

        Cow::Owned(result)
    }
}

impl Default for LuaHighlighter {
    fn default() -> Self {
        Self::new()
    }
}
