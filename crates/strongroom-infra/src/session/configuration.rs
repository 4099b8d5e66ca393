//! The settings a session factory is built from.

use std::fmt;

use strongroom_types::config::SchemaAction;
use strongroom_types::source::{ModelSource, TableDef};

use crate::sql::Dialect;

/// Connection settings plus every registered model source.
///
/// Rebuilt by the provider each time a new source registers; a factory keeps
/// the configuration it was built from.
#[derive(Clone)]
pub struct Configuration {
    connection_string: String,
    dialect: Dialect,
    schema_action: SchemaAction,
    sources: Vec<ModelSource>,
}

impl Configuration {
    pub fn new(
        connection_string: impl Into<String>,
        dialect: Dialect,
        schema_action: SchemaAction,
        sources: Vec<ModelSource>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            dialect,
            schema_action,
            sources,
        }
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn schema_action(&self) -> SchemaAction {
        self.schema_action
    }

    pub fn sources(&self) -> &[ModelSource] {
        &self.sources
    }

    /// Tables of all sources in registration order, first definition wins
    /// when two sources map the same table name.
    pub fn tables(&self) -> Vec<TableDef> {
        let mut tables: Vec<TableDef> = Vec::new();
        for table in self.sources.iter().flat_map(|s| s.tables()) {
            if !tables.iter().any(|t| t.name == table.name) {
                tables.push(table.clone());
            }
        }
        tables
    }
}

// Connection strings may carry credentials.
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("dialect", &self.dialect)
            .field("schema_action", &self.schema_action)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}
