//! Application services
//!
//! Each service reads aggregates through the [`WarrantyStore`](crate::ports::WarrantyStore)
//! port, applies one lifecycle step, and writes back with the version it read.
//! Business dates come from the injected clock in the configured timezone.

mod claims;
mod recall;
mod responses;
mod part_requests;
mod feedback;
mod work_logs;

pub use claims::{ClaimService, NewClaim, CoverageCheck};
pub use recall::{RecallCampaignService, NewCampaign, ApprovalOutcome};
pub use responses::RecallResponseService;
pub use part_requests::{PartRequestService, NewPartRequest};
pub use feedback::{FeedbackService, NewFeedback};
pub use work_logs::{WorkLogService, NewWorkLog};
