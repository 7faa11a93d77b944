//! Core Kernel - Foundational types shared by the warranty system
//!
//! This crate provides the building blocks used by every other crate:
//! - Strongly-typed identifiers for warranty entities
//! - The port error taxonomy and adapter health types
//! - Timezone-aware clocks for business dates
//! - Pagination requests and pages

pub mod identifiers;
pub mod ports;
pub mod temporal;
pub mod pagination;

pub use identifiers::{
    ClaimId, RecallRequestId, RecallResponseId, VehicleId, PartId,
    InstalledPartId, CustomerId, UserId, PartRequestId, FeedbackId, WorkLogId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    AdapterType,
};
pub use temporal::{Timezone, Clock, SystemClock, FixedClock, TemporalError};
pub use pagination::{PageRequest, Page, SortDirection};
