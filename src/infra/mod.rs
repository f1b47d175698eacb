pub mod sqlite;
pub mod templates;
pub mod translation;
