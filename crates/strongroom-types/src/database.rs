//! Supported database kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of relational store behind a connection string.
///
/// Postgres is the primary kind and the default; anything that is not
/// explicitly MySQL or SQLite is treated as Postgres by the dialect selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// PostgreSQL server (primary dialect).
    #[default]
    Postgres,
    /// MySQL server (secondary dialect).
    MySql,
    /// Embedded SQLite database file.
    Sqlite,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::Postgres => write!(f, "postgres"),
            DatabaseKind::MySql => write!(f, "mysql"),
            DatabaseKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DatabaseKind::Postgres),
            "mysql" => Ok(DatabaseKind::MySql),
            "sqlite" | "sqlite3" => Ok(DatabaseKind::Sqlite),
            other => Err(format!("unknown database kind: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_postgres() {
        assert_eq!(DatabaseKind::default(), DatabaseKind::Postgres);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("PostgreSQL".parse::<DatabaseKind>().unwrap(), DatabaseKind::Postgres);
        assert_eq!("pg".parse::<DatabaseKind>().unwrap(), DatabaseKind::Postgres);
        assert_eq!("mysql".parse::<DatabaseKind>().unwrap(), DatabaseKind::MySql);
        assert_eq!(" sqlite3 ".parse::<DatabaseKind>().unwrap(), DatabaseKind::Sqlite);
        assert!("oracle".parse::<DatabaseKind>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DatabaseKind::MySql).unwrap();
        assert_eq!(json, "\"mysql\"");
        let kind: DatabaseKind = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(kind, DatabaseKind::Sqlite);
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for kind in [DatabaseKind::Postgres, DatabaseKind::MySql, DatabaseKind::Sqlite] {
            assert_eq!(kind.to_string().parse::<DatabaseKind>().unwrap(), kind);
        }
    }
}
