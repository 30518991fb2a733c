use std::{
    fmt::Write,
    path::{Component, Path},
};

use sha2::{Digest, Sha256};

use crate::error::BundleError;

/// Lua 5.x reserved words
const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Convert a relative path to a `/`-separated string
///
/// `.` components are dropped. Fails for paths that are not valid UTF-8,
/// since the result ends up in generated Lua source.
pub fn normalize_path(path: &Path) -> Result<String, BundleError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                let Some(part) = part.to_str() else {
                    return Err(BundleError::config(format!(
                        "path is not valid UTF-8: {}",
                        path.display()
                    )));
                };
                parts.push(part);
            }
            _ => {
                return Err(BundleError::config(format!(
                    "expected a relative path without '..': {}",
                    path.display()
                )));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Render `value` as a double-quoted Lua string literal
pub fn lua_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Decimal escapes are the only numeric form Lua 5.1 understands
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Check if `name` can be used as a Lua local variable name
pub fn is_lua_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !LUA_KEYWORDS.contains(&name)
}

/// Hex-encoded SHA-256 of `contents`
pub fn sha256_hex(contents: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents.as_bytes());
    format!("{:x}", hasher.finalize())
}
