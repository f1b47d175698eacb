use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::QueryError;
use crate::infra::sqlite::query_builder::SqliteQueryBuilder;
use crate::infra::sqlite::schema::{open_connection, table_layout, TableLayout};
use crate::usecase::ports::source::{DataSourceAdapter, QueryBuilder, SourceColumn};

fn default_key() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub path: String,
}

/// A relation: rows of `table` whose `foreign_key` equals the `local_key` of
/// the row addressed by `from` (the root when absent). When several rows
/// match, filters and ordering see all of them and cells render one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinConfig {
    pub alias: String,
    pub table: String,
    pub local_key: String,
    #[serde(default = "default_key")]
    pub foreign_key: String,
    #[serde(default)]
    pub from: Option<String>,
}

/// Rows of the root table pointing at a parent through `parent_key`. Only
/// rows without a parent are listed at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChildrenConfig {
    pub parent_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteSourceConfig {
    pub table: String,
    #[serde(default = "default_key")]
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub joins: Vec<JoinConfig>,
    #[serde(default)]
    pub children: Option<ChildrenConfig>,
    #[serde(default)]
    pub templates_path: String,
}

impl SqliteSourceConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse source config: {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct JoinLayout {
    pub alias: String,
    pub from: Option<String>,
    pub local_key: String,
    pub foreign_key: String,
    pub table: TableLayout,
}

/// Source configuration checked against the live schema.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub root: TableLayout,
    pub primary_key: String,
    pub joins: Vec<JoinLayout>,
    pub children: Option<ChildrenConfig>,
}

impl SourceLayout {
    pub fn join(&self, alias: &str) -> Option<&JoinLayout> {
        self.joins.iter().find(|join| join.alias == alias)
    }

    /// Table behind `alias`, where `root_alias` names the root table.
    pub fn table_for(&self, alias: &str, root_alias: &str) -> Option<&TableLayout> {
        if alias == root_alias {
            return Some(&self.root);
        }
        self.join(alias).map(|join| &join.table)
    }
}

pub struct SqliteSource {
    db_path: PathBuf,
    layout: Arc<SourceLayout>,
    columns: Vec<SourceColumn>,
    templates_path: String,
}

impl SqliteSource {
    pub fn open(db_path: impl Into<PathBuf>, config: SqliteSourceConfig) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_connection(&db_path)?;

        let root = table_layout(&conn, &config.table)?;
        if !root.has_column(&config.primary_key) {
            anyhow::bail!(
                "primary key {} not found on {}",
                config.primary_key,
                config.table
            )
        }
        if let Some(children) = &config.children {
            if !root.has_column(&children.parent_key) {
                anyhow::bail!(
                    "parent key {} not found on {}",
                    children.parent_key,
                    config.table
                )
            }
        }

        let mut joins: Vec<JoinLayout> = Vec::with_capacity(config.joins.len());
        for join in &config.joins {
            if joins.iter().any(|known| known.alias == join.alias) {
                anyhow::bail!("duplicate join alias: {}", join.alias)
            }
            let from_table = match &join.from {
                None => &root,
                Some(from) => match joins.iter().find(|known| &known.alias == from) {
                    Some(known) => &known.table,
                    None => anyhow::bail!(
                        "join {} refers to {from}, which is not declared before it",
                        join.alias
                    ),
                },
            };
            if !from_table.has_column(&join.local_key) {
                anyhow::bail!(
                    "join {}: local key {} not found on {}",
                    join.alias,
                    join.local_key,
                    from_table.table
                )
            }
            let table = table_layout(&conn, &join.table)?;
            if !table.has_column(&join.foreign_key) {
                anyhow::bail!(
                    "join {}: foreign key {} not found on {}",
                    join.alias,
                    join.foreign_key,
                    join.table
                )
            }
            joins.push(JoinLayout {
                alias: join.alias.clone(),
                from: join.from.clone(),
                local_key: join.local_key.clone(),
                foreign_key: join.foreign_key.clone(),
                table,
            });
        }

        let columns = config
            .columns
            .iter()
            .map(|column| SourceColumn::new(&column.name, &column.path))
            .collect();

        Ok(Self {
            db_path,
            layout: Arc::new(SourceLayout {
                root,
                primary_key: config.primary_key,
                joins,
                children: config.children,
            }),
            columns,
            templates_path: config.templates_path,
        })
    }
}

impl DataSourceAdapter for SqliteSource {
    fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    fn create_query_builder(&self, alias: &str) -> Result<Box<dyn QueryBuilder>, QueryError> {
        if self.layout.join(alias).is_some() {
            return Err(QueryError::Message(format!(
                "root alias {alias} collides with a join alias"
            )));
        }
        let conn = open_connection(&self.db_path)
            .map_err(|err| QueryError::Message(format!("{err:#}")))?;
        Ok(Box::new(SqliteQueryBuilder::new(
            conn,
            alias,
            self.layout.clone(),
        )))
    }

    fn templates_path(&self) -> &str {
        &self.templates_path
    }
}
