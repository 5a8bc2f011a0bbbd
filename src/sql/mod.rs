//! SQL statement values, classification, and dialect translation.

pub mod statement;
pub mod tables;
pub mod translate;

pub use statement::{QueryParam, Statement, StatementKind, classify, insert_table_name};
pub use tables::{DEFAULT_ID_COLUMN, id_column_for};
pub use translate::{placeholder_count, translate};
