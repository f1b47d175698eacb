//! Server-side processing for paginated, filterable, sortable data tables.
//!
//! A request parameter bag (`draw`, `start`, `length`, `where`, `order`,
//! `columns`) is compiled into a query against a [`DataSourceAdapter`], the
//! resulting page is expanded with child rows and every cell is rendered
//! through a template, a registered operation or an accessor.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod usecase;

pub use config::DataTableConfig;
pub use domain::entities::entity::{Capabilities, DynEntity, Entity, EntityRef, FieldValue};
pub use domain::entities::request::DataTableRequest;
pub use domain::entities::response::DataTableResponse;
pub use error::{DataTableError, QueryError, TemplateError};
pub use usecase::ports::render::{RenderContext, TemplateEngine, Translator};
pub use usecase::ports::source::{DataSourceAdapter, QueryBuilder, SourceColumn};
pub use usecase::services::datatable_service::DataTableService;
