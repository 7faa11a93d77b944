//! Request and response bodies

pub mod claims;
pub mod recalls;
pub mod part_requests;
pub mod feedback;
pub mod work_logs;

use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{PageRequest, SortDirection};
use core_kernel::pagination::DEFAULT_PAGE_SIZE;
use domain_warranty::UnknownStatus;

use crate::error::ApiError;

/// Query parameters shared by the listing endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub status: Option<String>,
    pub vehicle_id: Option<Uuid>,
    pub warranty_claim_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub rating: Option<u8>,
    pub min_rating: Option<u8>,
}

impl ListQuery {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        let mut request = PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(DEFAULT_PAGE_SIZE));
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
            let dir = match self.sort_dir.as_deref() {
                Some(raw) => SortDirection::from_str(raw).map_err(ApiError::validation)?,
                None => SortDirection::Asc,
            };
            request = request.sorted_by(sort_by, dir);
        }
        Ok(request)
    }

    /// Parses the `status` parameter into one of the lifecycle enums
    pub fn status<S>(&self) -> Result<Option<S>, ApiError>
    where
        S: FromStr<Err = UnknownStatus>,
    {
        self.status
            .as_deref()
            .map(|raw| raw.parse::<S>().map_err(|e| ApiError::validation(e.to_string())))
            .transpose()
    }
}

/// Optional free-text note sent with an action
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_warranty::WarrantyClaimStatus;

    #[test]
    fn test_defaults_to_first_page() {
        let request = ListQuery::default().page_request().unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, DEFAULT_PAGE_SIZE);
        assert!(request.sort_by.is_none());
    }

    #[test]
    fn test_sort_direction_is_case_insensitive() {
        let query = ListQuery {
            sort_by: Some("claimDate".into()),
            sort_dir: Some("desc".into()),
            ..Default::default()
        };
        assert_eq!(query.page_request().unwrap().sort_dir, SortDirection::Desc);
    }

    #[test]
    fn test_bad_sort_direction_is_rejected() {
        let query = ListQuery {
            sort_by: Some("claimDate".into()),
            sort_dir: Some("sideways".into()),
            ..Default::default()
        };
        assert!(query.page_request().is_err());
    }

    #[test]
    fn test_status_parses_alias() {
        let query = ListQuery {
            status: Some("sc_review".into()),
            ..Default::default()
        };
        assert_eq!(
            query.status::<WarrantyClaimStatus>().unwrap(),
            Some(WarrantyClaimStatus::ManagerReview)
        );
    }
}
