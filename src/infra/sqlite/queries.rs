use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::domain::entities::entity::{EntityRef, FieldValue};
use crate::infra::sqlite::record::SqliteRecord;
use crate::infra::sqlite::schema::{quote, TableLayout};
use crate::infra::sqlite::source::SourceLayout;

/// Comma-separated, quoted column list of `layout`, optionally qualified.
pub fn select_list(layout: &TableLayout, alias: Option<&str>) -> String {
    layout
        .columns
        .iter()
        .map(|column| match alias {
            Some(alias) => format!("{}.{}", quote(alias), quote(&column.name)),
            None => quote(&column.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads every row of `layout` whose `key_column` is one of `keys`.
pub fn load_by_keys(
    conn: &Connection,
    layout: &TableLayout,
    key_column: &str,
    keys: &[Value],
    order_by: Option<&str>,
) -> Result<Vec<SqliteRecord>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat_n("?", keys.len())
        .collect::<Vec<_>>()
        .join(",");
    let mut sql = format!(
        "SELECT {}
         FROM {}
         WHERE {} IN ({placeholders})",
        select_list(layout, None),
        quote(&layout.table),
        quote(key_column),
    );
    if let Some(order_by) = order_by {
        sql.push_str(&format!(" ORDER BY {} ASC", quote(order_by)));
    }

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("failed to prepare {} lookup", layout.table))?;
    let records = stmt
        .query_map(rusqlite::params_from_iter(keys.iter()), |row| {
            SqliteRecord::read(row, layout)
        })
        .with_context(|| format!("failed to query {} rows", layout.table))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to collect {} rows", layout.table))?;

    Ok(records)
}

fn distinct_keys(records: &[SqliteRecord], column: &str) -> Vec<Value> {
    let mut seen = HashMap::new();
    for record in records {
        if let (Some(key), Some(value)) = (record.key(column), record.key_value(column)) {
            seen.entry(key).or_insert(value);
        }
    }
    seen.into_values().collect()
}

/// Attaches the rows of every join hanging off `from_alias`, recursing into
/// joins declared on those rows.
pub fn attach_relations(
    conn: &Connection,
    layout: &SourceLayout,
    records: &mut [SqliteRecord],
    from_alias: &str,
    root_alias: &str,
) -> Result<()> {
    for join in layout
        .joins
        .iter()
        .filter(|join| join.from.as_deref().unwrap_or(root_alias) == from_alias)
    {
        let keys = distinct_keys(records, &join.local_key);
        let mut related = load_by_keys(conn, &join.table, &join.foreign_key, &keys, None)?;
        attach_relations(conn, layout, &mut related, &join.alias, root_alias)?;

        let mut by_key = HashMap::<String, EntityRef>::new();
        for record in related {
            if let Some(key) = record.key(&join.foreign_key) {
                by_key
                    .entry(key)
                    .or_insert_with(|| Arc::new(record) as EntityRef);
            }
        }

        for record in records.iter_mut() {
            let related = record
                .key(&join.local_key)
                .and_then(|key| by_key.get(&key).cloned())
                .map(FieldValue::Entity)
                .unwrap_or(FieldValue::Null);
            record.relations.insert(join.alias.clone(), related);
        }
    }
    Ok(())
}

/// Loads the direct children of `parents`, in primary key order. Children
/// get their joins attached but no children of their own.
pub fn attach_children(
    conn: &Connection,
    layout: &SourceLayout,
    parents: &mut [SqliteRecord],
    root_alias: &str,
) -> Result<()> {
    let Some(children) = &layout.children else {
        return Ok(());
    };

    let keys = distinct_keys(parents, &layout.primary_key);
    let mut loaded = load_by_keys(
        conn,
        &layout.root,
        &children.parent_key,
        &keys,
        Some(&layout.primary_key),
    )?;
    attach_relations(conn, layout, &mut loaded, root_alias, root_alias)?;

    let mut by_parent = HashMap::<String, Vec<EntityRef>>::new();
    for child in loaded {
        if let Some(parent) = child.key(&children.parent_key) {
            by_parent.entry(parent).or_default().push(Arc::new(child));
        }
    }

    for parent in parents.iter_mut() {
        let list = parent
            .key(&layout.primary_key)
            .and_then(|key| by_parent.remove(&key))
            .unwrap_or_default();
        parent.children = Some(list);
    }
    Ok(())
}
