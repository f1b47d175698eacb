use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Value, ValueRef};

use crate::domain::entities::entity::{DynEntity, EntityRef, FieldValue};
use crate::infra::sqlite::schema::{TableColumn, TableLayout};

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A hydrated table row. Columns read as accessors, joined rows as accessors
/// named after their join alias.
#[derive(Clone, Default)]
pub struct SqliteRecord {
    pub fields: BTreeMap<String, FieldValue>,
    pub relations: BTreeMap<String, FieldValue>,
    pub children: Option<Vec<EntityRef>>,
}

impl SqliteRecord {
    pub fn read(row: &rusqlite::Row<'_>, layout: &TableLayout) -> rusqlite::Result<Self> {
        let mut fields = BTreeMap::new();
        for (idx, column) in layout.columns.iter().enumerate() {
            fields.insert(column.name.clone(), to_field_value(row.get_ref(idx)?, column));
        }
        Ok(Self {
            fields,
            ..Self::default()
        })
    }

    pub fn key(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(key_string)
    }

    pub fn key_value(&self, column: &str) -> Option<Value> {
        match self.fields.get(column)? {
            FieldValue::Int(value) => Some(Value::Integer(*value)),
            FieldValue::Text(value) => Some(Value::Text(value.clone())),
            _ => None,
        }
    }
}

impl DynEntity for SqliteRecord {
    fn type_name(&self) -> &'static str {
        "SqliteRecord"
    }

    fn invoke(&self, _method: &str) -> Option<FieldValue> {
        None
    }

    fn get(&self, accessor: &str) -> Option<FieldValue> {
        self.fields
            .get(accessor)
            .or_else(|| self.relations.get(accessor))
            .cloned()
    }

    fn children(&self) -> Option<Vec<EntityRef>> {
        self.children.clone()
    }
}

pub fn key_string(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Int(value) => Some(value.to_string()),
        FieldValue::Text(value) => Some(value.clone()),
        _ => None,
    }
}

pub fn to_field_value(value: ValueRef<'_>, column: &TableColumn) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(value) if column.is_boolean() => FieldValue::Bool(value != 0),
        ValueRef::Integer(value) => FieldValue::Int(value),
        ValueRef::Real(value) => FieldValue::Float(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            if column.is_temporal() {
                if let Some(value) = parse_temporal(&text) {
                    return value;
                }
            }
            FieldValue::Text(text)
        }
    }
}

fn parse_temporal(text: &str) -> Option<FieldValue> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(FieldValue::DateTime)
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .map(FieldValue::Date)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(decl_type: &str) -> TableColumn {
        TableColumn {
            name: "c".to_string(),
            decl_type: decl_type.to_string(),
        }
    }

    #[test]
    fn temporal_columns_parse_dates_and_datetimes() {
        let date = to_field_value(ValueRef::Text(b"2024-02-29"), &column("DATE"));
        assert!(matches!(date, FieldValue::Date(value) if value.to_string() == "2024-02-29"));

        let datetime = to_field_value(ValueRef::Text(b"2024-02-29 13:45:00"), &column("DATETIME"));
        assert!(matches!(datetime, FieldValue::DateTime(_)));

        let garbage = to_field_value(ValueRef::Text(b"soon"), &column("DATE"));
        assert!(matches!(garbage, FieldValue::Text(ref value) if value == "soon"));
    }

    #[test]
    fn plain_columns_keep_sqlite_types() {
        assert!(matches!(
            to_field_value(ValueRef::Text(b"2024-02-29"), &column("TEXT")),
            FieldValue::Text(_)
        ));
        assert!(matches!(
            to_field_value(ValueRef::Integer(1), &column("BOOLEAN")),
            FieldValue::Bool(true)
        ));
        assert!(matches!(
            to_field_value(ValueRef::Integer(7), &column("INTEGER")),
            FieldValue::Int(7)
        ));
        assert!(matches!(
            to_field_value(ValueRef::Null, &column("DATE")),
            FieldValue::Null
        ));
    }
}
