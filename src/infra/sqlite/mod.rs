pub mod queries;
pub mod query_builder;
pub mod record;
pub mod schema;
pub mod source;
