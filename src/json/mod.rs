//! Tolerant loader and stable serializer for language files.
//!
//! Loading is forgiving: a fixed encoding fallback chain, comment
//! stripping and control-character cleanup, then a strict
//! `serde_json` parse with a permissive `jsonc-parser` fallback for
//! trailing commas. Serializing is the opposite — one canonical output
//! form so that repeated syncs are byte-reproducible and diff-friendly.

mod clean;
mod decode;
mod escape;

use std::path::{
    Path,
    PathBuf,
};

use jsonc_parser::ParseOptions;
use serde_json::Value;
use thiserror::Error;

use crate::map::LanguageMap;

/// Error loading a language file.
#[derive(Error, Debug)]
pub enum ParseError {
    /// No encoding in the fallback chain could decode the bytes.
    #[error("failed to decode bytes with any supported encoding")]
    Encoding,
    /// Neither the strict nor the permissive parser accepted the text.
    #[error("invalid JSON: {0}")]
    Syntax(String),
    /// The document parsed but its root is not an object (or `null`).
    #[error("expected a top-level object, found {0}")]
    UnexpectedRoot(&'static str),
    /// A value is an object or array; language maps are flat.
    #[error("key '{0}' holds a nested value, language maps must be flat")]
    NestedValue(String),
    /// Reading the file failed.
    #[error("failed to read language file: {0}")]
    Io(#[from] std::io::Error),
}

/// Error persisting a language file.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Creating a parent directory failed.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing the file itself failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse raw bytes into a [`LanguageMap`], preserving source key order.
///
/// A top-level `null` (or blank input) yields an empty map.
///
/// # Errors
/// [`ParseError`] if no decode/parse attempt yields a top-level object.
pub fn load_bytes(bytes: &[u8]) -> Result<LanguageMap, ParseError> {
    let (text, _encoding) = decode::decode(bytes).ok_or(ParseError::Encoding)?;
    let cleaned = clean::clean_source(&text);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Some(value),
        Err(strict_err) => {
            tracing::debug!(error = %strict_err, "strict parse failed, trying permissive parser");
            jsonc_parser::parse_to_serde_value(&cleaned, &ParseOptions::default())
                .map_err(|e| ParseError::Syntax(e.to_string()))?
        }
    };

    match value {
        None | Some(Value::Null) => Ok(LanguageMap::new()),
        Some(Value::Object(object)) => object_to_map(object),
        Some(other) => Err(ParseError::UnexpectedRoot(value_kind(&other))),
    }
}

/// Read and parse a language file from disk.
///
/// # Errors
/// [`ParseError`] on read or parse failure.
pub fn load_file(path: &Path) -> Result<LanguageMap, ParseError> {
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes)
}

/// Serialize a map to its canonical text form.
///
/// Two-space indent, keys in map order, `\n` line endings, one trailing
/// newline. Non-ASCII is emitted literally except for the escape set in
/// [`escape`].
#[must_use]
pub fn serialize(map: &LanguageMap) -> String {
    if map.is_empty() {
        return "{}\n".to_string();
    }

    let mut out = String::new();
    out.push_str("{\n");
    let last = map.len().saturating_sub(1);
    for (i, (key, value)) in map.iter().enumerate() {
        out.push_str("  ");
        escape::push_json_string(&mut out, key);
        out.push_str(": ");
        escape::push_json_string(&mut out, value);
        if i != last {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// Serialize a map to UTF-8 bytes.
#[must_use]
pub fn to_bytes(map: &LanguageMap) -> Vec<u8> {
    serialize(map).into_bytes()
}

/// Write a map to disk in canonical form, creating missing parent
/// directories.
///
/// # Errors
/// [`WriteError`] on I/O failure.
pub fn write_file(path: &Path, map: &LanguageMap) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, to_bytes(map)).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a parsed JSON object into a flat string map.
///
/// Scalar non-string values keep their JSON rendering ("5", "true",
/// "null"); container values are rejected.
fn object_to_map(object: serde_json::Map<String, Value>) -> Result<LanguageMap, ParseError> {
    let mut map = LanguageMap::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Object(_) | Value::Array(_) => return Err(ParseError::NestedValue(key)),
            scalar => scalar.to_string(),
        };
        map.insert(key, text);
    }
    Ok(map)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
