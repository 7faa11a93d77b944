//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! warranty lifecycle test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built dates, identifiers, actors, and amounts
//! - `builders`: Builder patterns for vehicles, parts, installations, and claims
//! - `scenario`: Seeds a store with a fleet carrying one part
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for domain errors and invariants
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod scenario;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use scenario::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
