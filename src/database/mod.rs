pub mod manager;
pub mod query_builder;
pub mod values;

pub use manager::{DatabaseError, DatabaseManager, QueryTimer};
pub use query_builder::{ListParams, QueryBuilder, SortDirection};
pub use values::{bind_all, bind_value, SqlStatement, SqlValue};
