//! Message catalog: resolves the keys carried by [`ExecutionError`] into
//! display text. Nothing inside the engine formats messages; this is only
//! used where an error reaches a human.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ExecutionError;

const ENGLISH: &str = include_str!("../lang/en.lang");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("line {line}: expected `key=value`")]
    Malformed { line: usize },
    #[error("line {line}: duplicate key `{key}`")]
    Duplicate { line: usize, key: String },
    #[error("cannot read catalog: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Parse `key=value` lines. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut entries = HashMap::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(CatalogError::Malformed { line: i + 1 });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CatalogError::Malformed { line: i + 1 });
            }
            if entries.insert(key.to_string(), value.to_string()).is_some() {
                return Err(CatalogError::Duplicate { line: i + 1, key: key.to_string() });
            }
        }
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    /// The built-in English catalog.
    pub fn english() -> Self {
        Self::parse(ENGLISH).unwrap_or_default()
    }

    /// Template for `key`, or the key itself when missing.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace `{name}` placeholders with values from `args`. Unknown
/// placeholders are left as written.
fn substitute<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match lookup(name) {
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl ExecutionError {
    /// Render as `"<name>: <message>"` through `catalog`.
    pub fn format(&self, catalog: &Catalog) -> String {
        let name = catalog.get(self.name.key());
        let msg = substitute(catalog.get(self.msg), |k| self.arg(k));
        format!("{name}: {msg}")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
