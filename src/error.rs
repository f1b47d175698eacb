use thiserror::Error;

/// Failure reported by a query builder while executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("failed to render {template}: {message}")]
    Render { template: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataTableError {
    /// No template, operation or accessor renders the column.
    #[error("{message}: {column}")]
    NoRenderInfo { message: String, column: String },

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}
