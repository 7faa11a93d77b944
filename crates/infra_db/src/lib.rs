//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the warranty lifecycle, built on SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL for one aggregate each and map rows to domain
//! types. [`PostgresWarrantyStore`] composes them into the
//! `domain_warranty::WarrantyStore` port.
//!
//! # Concurrency
//!
//! Every aggregate row carries a `version` column. Updates are conditional
//! on the version the caller read, and multi-aggregate operations run in a
//! single transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresWarrantyStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/warranty")).await?;
//! let store = PostgresWarrantyStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresWarrantyStore;
