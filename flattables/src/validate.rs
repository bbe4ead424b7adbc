//! Table and column name validator
//!
//! FlatBuffers style wants UpperCamelCase tables and lowerCamelCase fields.
//! Names must also survive as Rust identifiers in the generated glue code
//! and must not be mistaken for schema keywords, so only ASCII letters and
//! digits are accepted. Underscores are rejected because `flatc` rewrites
//! them when deriving accessor names.
//!
//! These functions only return errors; logging is left to the caller.

use std::borrow::Cow;

use crate::error::{CodegenError, NameRole};

/// Marker that flags a column as deprecated, e.g. `age_deprecated_`.
pub const DEPRECATED_MARKER: &str = "_deprecated_";

/// Rust keywords (strict, reserved and contextual) that cannot be identifiers.
pub const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Words with meaning in a FlatBuffers schema, plus the tool's own name.
pub const SCHEMA_KEYWORDS: &[&str] = &[
    "namespace", "table", "struct", "root_type", "enum", "union", "include", "attribute",
    "file_identifier", "file_extension", "rpc_service", "bool", "byte", "ubyte", "short",
    "ushort", "int", "uint", "long", "ulong", "float", "double", "string", "flattables",
];

/// `true` if the first character is upper case. Empty input is `false`.
pub fn starts_with_upper(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// `true` if the first character is lower case. Empty input is `false`.
pub fn starts_with_lower(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

/// Case-insensitive match against Rust and schema keywords.
pub fn is_reserved_word(name: &str) -> bool {
    let lower = name.to_lowercase();
    RUST_KEYWORDS.contains(&lower.as_str()) || SCHEMA_KEYWORDS.contains(&lower.as_str())
}

/// Remove the first deprecation marker (matched ASCII case-insensitively).
///
/// Returns the usable name and whether a marker was found.
pub fn strip_deprecation(name: &str) -> (Cow<'_, str>, bool) {
    match name.to_ascii_lowercase().find(DEPRECATED_MARKER) {
        Some(at) => {
            let mut stripped = String::with_capacity(name.len() - DEPRECATED_MARKER.len());
            stripped.push_str(&name[..at]);
            stripped.push_str(&name[at + DEPRECATED_MARKER.len()..]);
            (Cow::Owned(stripped), true)
        }
        None => (Cow::Borrowed(name), false),
    }
}

/// Validate a table or column name.
///
/// Checks, in order, casing, reserved words, then illegal characters; the
/// first failure is returned. Column names have any deprecation marker
/// stripped before checking.
pub fn validate_name(name: &str, role: NameRole) -> Result<(), CodegenError> {
    let (name, _) = match role {
        NameRole::Column => strip_deprecation(name),
        NameRole::Table => (Cow::Borrowed(name), false),
    };
    let name = name.as_ref();

    let (cased, expected, suggestion) = match role {
        NameRole::Table => (starts_with_upper(name), "an upper", first_char_to_upper(name)),
        NameRole::Column => (starts_with_lower(name), "a lower", first_char_to_lower(name)),
    };
    if !cased {
        return Err(CodegenError::NamingConvention {
            role,
            name: name.to_string(),
            expected,
            suggestion,
            table: None,
        });
    }

    if is_reserved_word(name) {
        return Err(CodegenError::ReservedWord {
            role,
            name: name.to_string(),
            table: None,
        });
    }

    if let Some(ch) = name.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(CodegenError::IllegalCharacter {
            role,
            name: name.to_string(),
            ch,
            table: None,
        });
    }

    Ok(())
}

/// Validate a schema namespace: an ASCII letter, then ASCII letters, digits
/// or `_`, and not a reserved word.
pub fn validate_namespace(name: &str) -> Result<(), CodegenError> {
    let invalid = |reason: String| CodegenError::InvalidNamespace {
        name: name.to_string(),
        reason,
    };
    match name.chars().next() {
        None => return Err(invalid("it is empty".to_string())),
        Some(c) if !c.is_ascii_alphabetic() => {
            return Err(invalid(format!("it starts with '{}'", c.escape_default())))
        }
        Some(_) => {}
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(format!("'{}' is not allowed", c.escape_default())));
    }
    if is_reserved_word(name) {
        return Err(invalid("it is a reserved word".to_string()));
    }
    Ok(())
}

pub fn first_char_to_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn first_char_to_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
