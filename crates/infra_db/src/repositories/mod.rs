//! Repository implementations for the warranty aggregates
//!
//! Each repository owns the SQL for one aggregate and maps between database
//! rows and domain types. Queries are built at runtime with `query_as` and
//! `FromRow` rows; sort columns come only from the whitelisted sort enums.
//! Write methods that take a `PgConnection` run inside the caller's
//! transaction.

pub mod fleet;
pub mod claims;
pub mod recalls;
pub mod part_requests;
pub mod feedback;
pub mod work_logs;

pub use fleet::FleetRepository;
pub use claims::ClaimRepository;
pub use recalls::RecallRepository;
pub use part_requests::PartRequestRepository;
pub use feedback::FeedbackRepository;
pub use work_logs::WorkLogRepository;
