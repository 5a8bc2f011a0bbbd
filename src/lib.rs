//! Parkeo DB Adapter Library
//!
//! Persistence-compatibility layer that lets a MySQL-era parking-lot backend
//! run against PostgreSQL: dialect translation for statement text, a
//! mysql-driver-compatible result shape, timezone-pinned pooling, and
//! transactions bound to one physical connection.

pub mod config;
pub mod db;
pub mod error;
pub mod sql;
pub mod time;

pub use config::Config;
pub use db::{Adapter, FaultPolicy, LegacyResult, TransactionHandle};
pub use error::{AdapterError, AdapterResult};
pub use sql::{translate, QueryParam, Statement, StatementKind};
