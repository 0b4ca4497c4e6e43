//! JSON message files, flattened to dotted keys and back.
//!
//! A `.` or `\` inside an object key is escaped with a backslash, so
//! `{"Welcome back.": ..}` flattens to `Welcome back\.` and nests back
//! to the same single key.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::Path;

use crate::localizer::Messages;

/// Flatten nested objects into `a.b.c` keys. Non-string leaves are rejected.
pub fn flatten(value: &Value) -> Result<Messages> {
    let mut out = Messages::new();
    let Value::Object(map) = value else {
        bail!("Expected a JSON object at the top level");
    };
    flatten_into(map, "", &mut out)?;
    Ok(out)
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut Messages) -> Result<()> {
    for (key, value) in map {
        let segment = escape_segment(key);
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{}.{}", prefix, segment)
        };
        match value {
            Value::String(s) => {
                out.insert(path, s.clone());
            }
            Value::Object(inner) => flatten_into(inner, &path, out)?,
            other => bail!("Unsupported value at '{}': {}", path, other),
        }
    }
    Ok(())
}

fn escape_segment(segment: &str) -> String {
    segment.replace('\\', "\\\\").replace('.', "\\.")
}

/// Split a flattened key on unescaped dots, unescaping each segment.
fn split_key(key: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next().unwrap_or('\\')),
            '.' => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Rebuild nested objects from dotted keys. Fails when one key is both a
/// message and the parent of another message.
pub fn unflatten(messages: &Messages) -> Result<Value> {
    let mut root = Map::new();
    for (key, message) in messages {
        let parts = split_key(key);
        insert_path(&mut root, &parts, message)
            .with_context(|| format!("Cannot place message '{}'", key))?;
    }
    Ok(Value::Object(root))
}

fn insert_path(node: &mut Map<String, Value>, parts: &[String], message: &str) -> Result<()> {
    match parts {
        [] => Ok(()),
        [last] => {
            if node.get(last).is_some_and(Value::is_object) {
                bail!("'{}' already holds nested messages", last);
            }
            node.insert(last.clone(), Value::String(message.to_string()));
            Ok(())
        }
        [head, rest @ ..] => {
            let child = node
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => insert_path(map, rest, message),
                _ => bail!("'{}' is a message, not a group", head),
            }
        }
    }
}

pub fn read(path: &Path) -> Result<Messages> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    flatten(&value).with_context(|| format!("Invalid message file {}", path.display()))
}

/// Read a target file, treating a missing file as empty.
pub fn read_or_empty(path: &Path) -> Result<Messages> {
    if path.exists() {
        read(path)
    } else {
        Ok(Messages::new())
    }
}

pub fn write(path: &Path, messages: &Messages) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut json = serde_json::to_string_pretty(&unflatten(messages)?)?;
    json.push('\n');
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
