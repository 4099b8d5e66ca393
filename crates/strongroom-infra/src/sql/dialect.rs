//! SQL dialects and the database-kind to dialect selector.

use std::fmt;

use strongroom_types::database::DatabaseKind;
use strongroom_types::source::{ColumnKind, TableDef};

/// How a store reports the identifier it generated for an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRetrieval {
    /// `INSERT ... RETURNING id` yields a row.
    Returning,
    /// The driver reports the generated id with the query result.
    LastInsertId,
}

/// SQL generation rules for one family of stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Select the dialect for a database kind.
    ///
    /// MySQL and SQLite map to their own dialects; every other kind uses the
    /// primary (Postgres) dialect.
    pub fn for_kind(kind: DatabaseKind) -> Self {
        match kind {
            DatabaseKind::MySql => Dialect::MySql,
            DatabaseKind::Sqlite => Dialect::Sqlite,
            _ => Dialect::Postgres,
        }
    }

    /// Bind parameter for the 1-based position `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Quote an identifier, doubling any embedded quote characters.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    pub fn column_type(&self, kind: ColumnKind) -> &'static str {
        match (self, kind) {
            (Dialect::MySql, ColumnKind::Text) => "LONGTEXT",
            (Dialect::Sqlite, ColumnKind::Integer) => "INTEGER",
            (_, ColumnKind::Text) => "TEXT",
            (_, ColumnKind::Integer) => "BIGINT",
        }
    }

    /// Column definition of a store-generated primary key.
    pub fn identity_column(&self, name: &str) -> String {
        let name = self.quote(name);
        match self {
            Dialect::Postgres => format!("{name} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"),
            Dialect::MySql => format!("{name} BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY"),
            Dialect::Sqlite => format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"),
        }
    }

    pub fn id_retrieval(&self) -> IdRetrieval {
        match self {
            Dialect::MySql => IdRetrieval::LastInsertId,
            Dialect::Postgres | Dialect::Sqlite => IdRetrieval::Returning,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for a mapped table.
    pub fn create_table_sql(&self, table: &TableDef) -> String {
        let mut columns = vec![self.identity_column(&table.id_column)];
        for column in &table.columns {
            let null = if column.nullable { "NULL" } else { "NOT NULL" };
            columns.push(format!(
                "{} {} {null}",
                self.quote(&column.name),
                self.column_type(column.kind)
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote(&table.name),
            columns.join(", ")
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongroom_types::source::ColumnDef;

    fn notes_table() -> TableDef {
        TableDef::new("notes")
            .with_column(ColumnDef::text("body"))
            .with_column(ColumnDef::integer("pinned").nullable())
    }

    #[test]
    fn test_dialect_selection_is_total() {
        assert_eq!(Dialect::for_kind(DatabaseKind::MySql), Dialect::MySql);
        assert_eq!(Dialect::for_kind(DatabaseKind::Sqlite), Dialect::Sqlite);
        assert_eq!(Dialect::for_kind(DatabaseKind::Postgres), Dialect::Postgres);
        assert_eq!(Dialect::for_kind(DatabaseKind::default()), Dialect::Postgres);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
        assert_eq!(Dialect::Sqlite.placeholder(1), "?");
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(Dialect::Postgres.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(Dialect::MySql.quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_create_table_sqlite() {
        assert_eq!(
            Dialect::Sqlite.create_table_sql(&notes_table()),
            "CREATE TABLE IF NOT EXISTS \"notes\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"body\" TEXT NOT NULL, \"pinned\" INTEGER NULL)"
        );
    }

    #[test]
    fn test_create_table_mysql() {
        assert_eq!(
            Dialect::MySql.create_table_sql(&notes_table()),
            "CREATE TABLE IF NOT EXISTS `notes` (`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
             `body` LONGTEXT NOT NULL, `pinned` BIGINT NULL)"
        );
    }

    #[test]
    fn test_create_table_postgres() {
        let sql = Dialect::Postgres.create_table_sql(&notes_table());
        assert!(sql.contains("\"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY"));
        assert!(sql.contains("\"body\" TEXT NOT NULL"));
    }

    #[test]
    fn test_id_retrieval() {
        assert_eq!(Dialect::MySql.id_retrieval(), IdRetrieval::LastInsertId);
        assert_eq!(Dialect::Sqlite.id_retrieval(), IdRetrieval::Returning);
        assert_eq!(Dialect::Postgres.id_retrieval(), IdRetrieval::Returning);
    }
}
