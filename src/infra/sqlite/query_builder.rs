use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;

use crate::domain::entities::entity::EntityRef;
use crate::domain::entities::path::QualifiedColumn;
use crate::domain::entities::request::{FilterScalar, SortDirection};
use crate::error::QueryError;
use crate::infra::sqlite::queries::{attach_children, attach_relations, select_list};
use crate::infra::sqlite::record::SqliteRecord;
use crate::infra::sqlite::schema::quote;
use crate::infra::sqlite::source::SourceLayout;
use crate::usecase::ports::source::{Page, Predicate, QueryBuilder};

/// Query over the root table of a [`SourceLayout`], with every declared join
/// attached as a LEFT JOIN. Column references are checked against the
/// schema before any SQL is built.
pub struct SqliteQueryBuilder {
    conn: Connection,
    alias: String,
    layout: Arc<SourceLayout>,
    predicates: Vec<Predicate>,
    parameters: HashMap<String, FilterScalar>,
    orders: Vec<(QualifiedColumn, SortDirection)>,
    first_result: u64,
    max_results: Option<u64>,
}

impl SqliteQueryBuilder {
    pub fn new(conn: Connection, alias: &str, layout: Arc<SourceLayout>) -> Self {
        Self {
            conn,
            alias: alias.to_string(),
            layout,
            predicates: Vec::new(),
            parameters: HashMap::new(),
            orders: Vec::new(),
            first_result: 0,
            max_results: None,
        }
    }

    fn column_sql(&self, column: &QualifiedColumn) -> Result<String> {
        let Some(table) = self.layout.table_for(&column.alias, &self.alias) else {
            anyhow::bail!("unknown alias in column {column}")
        };
        if !table.has_column(&column.field) {
            anyhow::bail!("unknown column {column}")
        }
        Ok(format!("{}.{}", quote(&column.alias), quote(&column.field)))
    }

    fn from_sql(&self) -> String {
        let mut sql = format!("{} AS {}", quote(&self.layout.root.table), quote(&self.alias));
        for join in &self.layout.joins {
            let from = join.from.as_deref().unwrap_or(&self.alias);
            sql.push_str(&format!(
                " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
                quote(&join.table.table),
                quote(&join.alias),
                quote(&join.alias),
                quote(&join.foreign_key),
                quote(from),
                quote(&join.local_key),
            ));
        }
        sql
    }

    /// Rows with a parent are listed under that parent, not on their own.
    fn base_clauses(&self) -> Vec<String> {
        match &self.layout.children {
            Some(children) => vec![format!(
                "{}.{} IS NULL",
                quote(&self.alias),
                quote(&children.parent_key)
            )],
            None => Vec::new(),
        }
    }

    fn where_sql(&self, params: &mut Vec<Value>) -> Result<String> {
        let mut clauses = self.base_clauses();
        for predicate in &self.predicates {
            let clause = match predicate {
                Predicate::Compare { column, op, param } => {
                    let value = self
                        .parameters
                        .get(param)
                        .with_context(|| format!("missing parameter {param}"))?;
                    params.push(bind_value(value));
                    format!("{} {} ?", self.column_sql(column)?, op.as_sql())
                }
                Predicate::IsNull(column) => format!("{} IS NULL", self.column_sql(column)?),
                Predicate::IsNotNull(column) => {
                    format!("{} IS NOT NULL", self.column_sql(column)?)
                }
            };
            clauses.push(clause);
        }

        if clauses.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }

    /// Page rows are grouped per root key, so a joined column orders by its
    /// smallest value ascending and its largest value descending.
    fn order_sql(&self) -> Result<String> {
        if self.orders.is_empty() {
            return Ok(String::new());
        }
        let terms = self
            .orders
            .iter()
            .map(|(column, direction)| {
                let aggregate = match direction {
                    SortDirection::Asc => "MIN",
                    SortDirection::Desc => "MAX",
                };
                Ok(format!(
                    "{aggregate}({}) {}",
                    self.column_sql(column)?,
                    direction.as_sql()
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }

    fn count_filtered(&self) -> Result<u64> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(DISTINCT {}.{}) FROM {}{}",
            quote(&self.alias),
            quote(&self.layout.primary_key),
            self.from_sql(),
            self.where_sql(&mut params)?,
        );
        let count: i64 = self
            .conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))
            .context("failed to query filtered row count")?;
        Ok(count.max(0) as u64)
    }

    /// One record per root row, however many rows a join matches.
    fn load_page(&self) -> Result<Vec<SqliteRecord>> {
        let mut params = Vec::new();
        let where_sql = self.where_sql(&mut params)?;
        let limit = self
            .max_results
            .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        params.push(Value::Integer(limit));
        params.push(Value::Integer(
            i64::try_from(self.first_result).unwrap_or(i64::MAX),
        ));

        let sql = format!(
            "SELECT {} FROM {}{} GROUP BY {}.{}{} LIMIT ? OFFSET ?",
            select_list(&self.layout.root, Some(&self.alias)),
            self.from_sql(),
            where_sql,
            quote(&self.alias),
            quote(&self.layout.primary_key),
            self.order_sql()?,
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("failed to prepare page query")?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                SqliteRecord::read(row, &self.layout.root)
            })
            .context("failed to query page")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to collect page")?;
        Ok(records)
    }

    fn try_fetch_page(&self) -> Result<Page> {
        let mut records = self.load_page()?;
        attach_relations(&self.conn, &self.layout, &mut records, &self.alias, &self.alias)?;
        attach_children(&self.conn, &self.layout, &mut records, &self.alias)?;
        let filtered = self.count_filtered()?;

        Ok(Page {
            rows: records
                .into_iter()
                .map(|record| Arc::new(record) as EntityRef)
                .collect(),
            filtered,
        })
    }

    fn try_count_all(&self) -> Result<u64> {
        let clauses = self.base_clauses();
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT COUNT(*) FROM {} AS {}{where_sql}",
            quote(&self.layout.root.table),
            quote(&self.alias),
        );
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .context("failed to query total row count")?;
        Ok(count.max(0) as u64)
    }
}

fn bind_value(value: &FilterScalar) -> Value {
    match value {
        FilterScalar::Bool(value) => Value::Integer(i64::from(*value)),
        FilterScalar::Int(value) => Value::Integer(*value),
        FilterScalar::Float(value) => Value::Real(*value),
        FilterScalar::Text(value) => Value::Text(value.clone()),
    }
}

fn query_error(err: anyhow::Error) -> QueryError {
    QueryError::Message(format!("{err:#}"))
}

impl QueryBuilder for SqliteQueryBuilder {
    fn root_alias(&self) -> &str {
        &self.alias
    }

    fn has_root_field(&self, field: &str) -> bool {
        self.layout.root.has_column(field)
    }

    fn and_where(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    fn set_parameter(&mut self, name: &str, value: FilterScalar) {
        self.parameters.insert(name.to_string(), value);
    }

    fn add_order_by(&mut self, column: QualifiedColumn, direction: SortDirection) {
        self.orders.push((column, direction));
    }

    fn set_first_result(&mut self, offset: u64) {
        self.first_result = offset;
    }

    fn set_max_results(&mut self, limit: Option<u64>) {
        self.max_results = limit;
    }

    fn fetch_page(&self) -> Result<Page, QueryError> {
        self.try_fetch_page().map_err(query_error)
    }

    fn count_all(&self) -> Result<u64, QueryError> {
        self.try_count_all().map_err(query_error)
    }
}
