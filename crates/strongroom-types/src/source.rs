//! Model sources: the unit in which mapping metadata is registered.
//!
//! A `ModelSource` names a group of tables contributed by one or more entity
//! types. Session factory providers track which sources have been registered
//! and rebuild their configuration whenever a new one arrives.

use std::fmt;

/// Storage class of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
}

/// A non-identifier column of a mapped table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
            nullable: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Integer,
            nullable: false,
        }
    }

    /// Allow NULL in this column.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A mapped table: name, store-generated identifier column and data columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableDef {
    pub name: String,
    pub id_column: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// A table whose identifier column is `id`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_column: "id".to_string(),
            columns: Vec::new(),
        }
    }

    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}

/// Registration unit handed to a session factory provider.
///
/// Two sources are the same registration when they are equal; registering an
/// equal source twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSource {
    name: String,
    tables: Vec<TableDef>,
}

impl ModelSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// A source with a blank name has no identity and cannot be registered.
    pub fn has_identity(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} tables)", self.name, self.tables.len())
    }
}
