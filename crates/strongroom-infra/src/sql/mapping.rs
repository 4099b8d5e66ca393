//! Entity mappings: how one model type is stored in one table.
//!
//! A mapping lists the data columns of a table together with a reader per
//! column, and carries the caller-supplied factory that builds a model from a
//! stored row. The mapping also describes the model source that a repository
//! registers with its session factory provider.

use sqlx::any::{Any, AnyArguments, AnyRow};
use sqlx::query::Query;
use strongroom_types::source::{ColumnDef, ModelSource, TableDef};

/// Builds a model from a row selected with `Statements::select`.
pub type Hydrate<T> = fn(&AnyRow) -> Result<T, sqlx::Error>;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
}

impl FieldValue {
    /// Bind this value as the next parameter of `query`.
    pub fn bind<'q>(
        self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Query<'q, Any, AnyArguments<'q>> {
        match self {
            FieldValue::Text(value) => query.bind(value),
            FieldValue::Integer(value) => query.bind(value),
        }
    }
}

enum Reader<T> {
    Text(fn(&T) -> &str),
    OptionalText(fn(&T) -> Option<&str>),
    Integer(fn(&T) -> i64),
    OptionalInteger(fn(&T) -> Option<i64>),
}

impl<T> Reader<T> {
    fn read(&self, model: &T) -> FieldValue {
        match self {
            Reader::Text(read) => FieldValue::Text(Some(read(model).to_string())),
            Reader::OptionalText(read) => FieldValue::Text(read(model).map(str::to_string)),
            Reader::Integer(read) => FieldValue::Integer(Some(read(model))),
            Reader::OptionalInteger(read) => FieldValue::Integer(read(model)),
        }
    }
}

/// Storage mapping of `T` onto a single table of a model source.
pub struct EntityMapping<T> {
    source: ModelSource,
    table: TableDef,
    readers: Vec<Reader<T>>,
    hydrate: Hydrate<T>,
}

impl<T> EntityMapping<T> {
    /// Start a mapping of `T` onto `table`, registered as part of `source`.
    pub fn builder(source: impl Into<String>, table: impl Into<String>) -> EntityMappingBuilder<T> {
        EntityMappingBuilder {
            source: source.into(),
            table: TableDef::new(table),
            readers: Vec::new(),
        }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn table(&self) -> &TableDef {
        &self.table
    }

    pub fn hydrate(&self) -> Hydrate<T> {
        self.hydrate
    }

    /// Parameter values of every data column, in column order.
    pub fn values(&self, model: &T) -> Vec<FieldValue> {
        self.readers.iter().map(|reader| reader.read(model)).collect()
    }
}

pub struct EntityMappingBuilder<T> {
    source: String,
    table: TableDef,
    readers: Vec<Reader<T>>,
}

impl<T> EntityMappingBuilder<T> {
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.table.id_column = name.into();
        self
    }

    pub fn text(self, name: impl Into<String>, read: fn(&T) -> &str) -> Self {
        self.column(ColumnDef::text(name), Reader::Text(read))
    }

    pub fn optional_text(self, name: impl Into<String>, read: fn(&T) -> Option<&str>) -> Self {
        self.column(ColumnDef::text(name).nullable(), Reader::OptionalText(read))
    }

    pub fn integer(self, name: impl Into<String>, read: fn(&T) -> i64) -> Self {
        self.column(ColumnDef::integer(name), Reader::Integer(read))
    }

    pub fn optional_integer(self, name: impl Into<String>, read: fn(&T) -> Option<i64>) -> Self {
        self.column(
            ColumnDef::integer(name).nullable(),
            Reader::OptionalInteger(read),
        )
    }

    fn column(mut self, def: ColumnDef, reader: Reader<T>) -> Self {
        self.table.columns.push(def);
        self.readers.push(reader);
        self
    }

    /// Finish the mapping with the factory that builds `T` from a row.
    pub fn build(self, hydrate: Hydrate<T>) -> EntityMapping<T> {
        let source = ModelSource::new(self.source).with_table(self.table.clone());
        EntityMapping {
            source,
            table: self.table,
            readers: self.readers,
            hydrate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;
    use strongroom_types::source::ColumnKind;

    struct Reading {
        sensor: String,
        label: Option<String>,
        value: i64,
        offset: Option<i64>,
    }

    fn hydrate_reading(row: &AnyRow) -> Result<Reading, sqlx::Error> {
        Ok(Reading {
            sensor: row.try_get("sensor")?,
            label: row.try_get("label")?,
            value: row.try_get("value")?,
            offset: row.try_get("offset")?,
        })
    }

    fn mapping() -> EntityMapping<Reading> {
        EntityMapping::<Reading>::builder("telemetry", "readings")
            .id_column("reading_id")
            .text("sensor", |r| r.sensor.as_str())
            .optional_text("label", |r| r.label.as_deref())
            .integer("value", |r| r.value)
            .optional_integer("offset", |r| r.offset)
            .build(hydrate_reading)
    }

    #[test]
    fn test_builder_describes_table_and_source() {
        let mapping = mapping();
        let table = mapping.table();

        assert_eq!(table.name, "readings");
        assert_eq!(table.id_column, "reading_id");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["sensor", "label", "value", "offset"]);
        assert_eq!(table.columns[2].kind, ColumnKind::Integer);
        assert!(table.columns[1].nullable);
        assert!(!table.columns[0].nullable);

        assert_eq!(mapping.source().name(), "telemetry");
        assert_eq!(mapping.source().tables(), &[table.clone()]);
    }

    #[test]
    fn test_values_follow_column_order() {
        let reading = Reading {
            sensor: "boiler".to_string(),
            label: None,
            value: 71,
            offset: Some(-2),
        };

        assert_eq!(
            mapping().values(&reading),
            vec![
                FieldValue::Text(Some("boiler".to_string())),
                FieldValue::Text(None),
                FieldValue::Integer(Some(71)),
                FieldValue::Integer(Some(-2)),
            ]
        );
    }
}
