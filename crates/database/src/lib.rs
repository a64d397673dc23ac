mod client;
mod error;
mod filter;
mod paginator;
mod query;

pub mod mock;

#[cfg(feature = "postgres")]
mod postgres;

pub use client::TableClient;
pub use error::StorageError;
pub use filter::ListFilter;
pub use paginator::{paginate, Page};
pub use query::{Condition, Operator, OrTerm, OrderDirection, StatusFilter, TableQuery};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresClient, PostgresEnv};
