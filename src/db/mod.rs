//! Database layer: pooling, execution, transactions, and the legacy result
//! shape.

pub mod adapter;
pub mod compat;
pub mod executor;
pub mod pool;
pub mod rows;
pub mod transaction;

pub use adapter::Adapter;
pub use compat::LegacyResult;
pub use executor::RawExecution;
pub use pool::{FaultPolicy, PoolManager};
pub use rows::ColumnMetadata;
pub use transaction::TransactionHandle;
