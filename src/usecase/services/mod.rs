pub mod assembler;
pub mod cell_formatter;
pub mod datatable_service;
pub mod executor;
pub mod query_compiler;
pub mod row_expander;

#[cfg(test)]
pub(crate) mod testing;
