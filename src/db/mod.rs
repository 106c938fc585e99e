//! Pooled database access: connection pools, parameter binding, row
//! decoding, and the query executor.

mod decode;
pub mod executor;
pub mod params;
pub mod pool;

pub use executor::QueryExecutor;
pub use params::{PlaceholderStyle, SqlParam};
pub use pool::{Backend, DbConnection, DbPool};
