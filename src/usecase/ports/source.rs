use crate::domain::entities::entity::EntityRef;
use crate::domain::entities::path::QualifiedColumn;
use crate::domain::entities::request::{FilterScalar, SortDirection};
use crate::error::QueryError;

/// A declared column: the name clients refer to and the entity path behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    pub path: String,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

pub trait DataSourceAdapter: Send + Sync {
    /// Declared columns in display order.
    fn columns(&self) -> &[SourceColumn];

    /// A fresh, unfiltered query over the root entity addressed as `alias`.
    fn create_query_builder(&self, alias: &str) -> Result<Box<dyn QueryBuilder>, QueryError>;

    /// Prefix under which per-column templates are looked up.
    fn templates_path(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Like,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Compares the column against the named bind parameter.
    Compare {
        column: QualifiedColumn,
        op: CompareOp,
        param: String,
    },
    IsNull(QualifiedColumn),
    IsNotNull(QualifiedColumn),
}

/// Materialized page plus the number of root rows matching the filters,
/// ignoring offset and limit.
pub struct Page {
    pub rows: Vec<EntityRef>,
    pub filtered: u64,
}

/// Mutable query over one root entity. Predicates are AND-ed, orderings are
/// applied in the order added.
pub trait QueryBuilder: Send {
    fn root_alias(&self) -> &str;

    /// Whether `field` is a mapped field of the root entity. Relations are not
    /// fields.
    fn has_root_field(&self, field: &str) -> bool;

    fn and_where(&mut self, predicate: Predicate);

    fn set_parameter(&mut self, name: &str, value: FilterScalar);

    fn add_order_by(&mut self, column: QualifiedColumn, direction: SortDirection);

    fn set_first_result(&mut self, offset: u64);

    /// `None` removes the limit.
    fn set_max_results(&mut self, limit: Option<u64>);

    fn fetch_page(&self) -> Result<Page, QueryError>;

    /// Counts root rows, ignoring predicates, ordering and paging.
    fn count_all(&self) -> Result<u64, QueryError>;
}
