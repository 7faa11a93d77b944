//! Warranty Lifecycle Domain
//!
//! This crate implements the status lifecycles of the EV warranty back end:
//! warranty claims, recall campaigns with their per-vehicle responses,
//! replacement part requests, technician work logs, and customer feedback
//! on completed claims.
//!
//! # Recall Flow
//!
//! ```text
//! Campaign: PENDING_ADMIN_APPROVAL -> APPROVED_BY_ADMIN -> WAITING_CUSTOMER_CONFIRM -> CLAIM_CREATED
//!                                  \-> REJECTED_BY_ADMIN
//!                  (approval fans out one response per affected vehicle)
//! Response: PENDING -> ACCEPTED -> IN_PROGRESS -> COMPLETED
//!                   \-> DECLINED
//!                  (acceptance creates a SUBMITTED warranty claim)
//! ```

pub mod transition;
pub mod error;
pub mod actor;
pub mod fleet;
pub mod coverage;
pub mod claim;
pub mod recall;
pub mod response;
pub mod part_request;
pub mod feedback;
pub mod work_log;
pub mod ports;
pub mod memory;
pub mod services;

pub use transition::{Lifecycle, InvalidTransition, UnknownStatus};
pub use error::WarrantyError;
pub use actor::{Actor, Role, UnknownRole};
pub use fleet::{Vehicle, Part, InstalledPart};
pub use coverage::{assess_coverage, CoverageAssessment, WarrantyStatus, ClaimOption};
pub use claim::{WarrantyClaim, WarrantyClaimStatus};
pub use recall::{RecallRequest, RecallRequestStatus};
pub use response::{RecallResponse, RecallResponseStatus};
pub use part_request::{PartRequest, PartRequestStatus};
pub use feedback::{Feedback, FeedbackSummary, Rating};
pub use work_log::WorkLog;
pub use ports::{
    WarrantyStore, ClaimFilter, PartRequestFilter, FeedbackFilter, WorkLogFilter, ClaimSort,
    CampaignSort, ResponseSort, PartRequestSort, FeedbackSort, WorkLogSort,
};
pub use memory::InMemoryWarrantyStore;
pub use services::{
    ClaimService, RecallCampaignService, RecallResponseService, PartRequestService,
    FeedbackService, WorkLogService, NewClaim, NewCampaign, NewPartRequest, NewFeedback,
    NewWorkLog, CoverageCheck, ApprovalOutcome,
};
