//! Domain Adapters
//!
//! Implementations of domain ports backed by PostgreSQL.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresWarrantyStore;
//! use domain_warranty::WarrantyStore;
//!
//! let store: Arc<dyn WarrantyStore> = Arc::new(PostgresWarrantyStore::new(pool));
//! let claim = store.get_claim(claim_id).await?;
//! ```

pub mod warranty;

pub use warranty::PostgresWarrantyStore;
