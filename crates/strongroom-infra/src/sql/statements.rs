//! CRUD statements prepared once per repository.

use strongroom_types::source::TableDef;

use super::dialect::{Dialect, IdRetrieval};

/// Dialect-specific SQL for the four identifier-based operations of a table.
///
/// Bind order: `insert` takes the data columns in mapping order, `update`
/// takes the data columns followed by the id, `select` and `delete` take the
/// id only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub insert: String,
    pub select: String,
    pub update: String,
    pub delete: String,
    pub id_retrieval: IdRetrieval,
}

impl Statements {
    pub fn prepare(dialect: Dialect, table: &TableDef) -> Self {
        let name = dialect.quote(&table.name);
        let id = dialect.quote(&table.id_column);
        let columns: Vec<String> = table.columns.iter().map(|c| dialect.quote(&c.name)).collect();
        let id_retrieval = dialect.id_retrieval();

        let mut insert = if columns.is_empty() {
            match dialect {
                Dialect::MySql => format!("INSERT INTO {name} () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => format!("INSERT INTO {name} DEFAULT VALUES"),
            }
        } else {
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| dialect.placeholder(i)).collect();
            format!(
                "INSERT INTO {name} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            )
        };
        if id_retrieval == IdRetrieval::Returning {
            insert.push_str(&format!(" RETURNING {id}"));
        }

        let select = format!(
            "SELECT {} FROM {name} WHERE {id} = {}",
            std::iter::once(id.clone())
                .chain(columns.iter().cloned())
                .collect::<Vec<_>>()
                .join(", "),
            dialect.placeholder(1)
        );

        // A table without data columns still needs a statement that reports
        // whether the row exists.
        let assignments = if columns.is_empty() {
            format!("{id} = {id}")
        } else {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{column} = {}", dialect.placeholder(i + 1)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let update = format!(
            "UPDATE {name} SET {assignments} WHERE {id} = {}",
            dialect.placeholder(columns.len() + 1)
        );

        let delete = format!("DELETE FROM {name} WHERE {id} = {}", dialect.placeholder(1));

        Self {
            insert,
            select,
            update,
            delete,
            id_retrieval,
        }
    }
}
