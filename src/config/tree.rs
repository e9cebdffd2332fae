//! Partial configuration trees.
//!
//! Each source (file, environment, flags) is decoded into a [`ConfigTree`]:
//! a section → key → value mapping in the config file's shape, tagged with
//! the [`Source`] it came from. Trees are only ever read by the resolver;
//! a key missing from a tree means "this source says nothing".

use std::fmt;

use toml::{Table, Value};

use crate::config::field::Field;

/// Origin of a configuration value, in ascending precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Default,
    File,
    Environment,
    Flag,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Default => "default",
            Source::File => "file",
            Source::Environment => "environment",
            Source::Flag => "flag",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's view of the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    source: Source,
    table: Table,
}

impl ConfigTree {
    /// An empty tree; contributes nothing when resolved.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            table: Table::new(),
        }
    }

    /// Wrap an already-parsed table, e.g. the contents of a config file.
    pub fn from_table(source: Source, table: Table) -> Self {
        Self { source, table }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Set `field` to `value`, creating its section if needed.
    pub fn insert(&mut self, field: &Field, value: Value) {
        let table = match field.section {
            None => &mut self.table,
            Some(section) => {
                let entry = self
                    .table
                    .entry(section.to_string())
                    .or_insert(Value::Table(Table::new()));
                if !entry.is_table() {
                    *entry = Value::Table(Table::new());
                }
                match entry {
                    Value::Table(table) => table,
                    _ => return,
                }
            }
        };
        table.insert(field.key.to_string(), value);
    }

    /// The value this tree holds for `field`, if any.
    ///
    /// A section that is present but not a table holds nothing; see
    /// [`misplaced_sections`](Self::misplaced_sections).
    pub fn get(&self, field: &Field) -> Option<&Value> {
        match field.section {
            None => self.table.get(field.key),
            Some(section) => self.table.get(section)?.as_table()?.get(field.key),
        }
    }

    /// Known sections holding something other than a table, with the type
    /// found, e.g. `("cluster", "string")` for `cluster = "oops"`.
    pub fn misplaced_sections(&self) -> Vec<(&str, &'static str)> {
        self.table
            .iter()
            .filter(|(key, value)| Field::is_section(key) && !value.is_table())
            .map(|(key, value)| (key.as_str(), value.type_str()))
            .collect()
    }

    /// Dotted paths present in the tree that name no registered field.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut unknown = Vec::new();
        for (key, value) in &self.table {
            match value {
                Value::Table(section) if Field::is_section(key) => {
                    for inner in section.keys() {
                        if Field::lookup(Some(key), inner).is_none() {
                            unknown.push(format!("{}.{}", key, inner));
                        }
                    }
                }
                _ if Field::is_section(key) => {}
                _ => {
                    if Field::lookup(None, key).is_none() {
                        unknown.push(key.clone());
                    }
                }
            }
        }
        unknown
    }
}
