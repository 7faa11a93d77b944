//! Custom Test Assertions
//!
//! Assertion helpers for warranty errors and cross-entity invariants that
//! give more meaningful failure messages than a bare `assert!`.

use std::fmt::Debug;

use core_kernel::Page;
use domain_warranty::{RecallResponse, WarrantyClaim, WarrantyError};
use rust_decimal::Decimal;

/// Asserts that an operation failed with a conflict, including stale writes
pub fn assert_conflict<T: Debug>(result: &Result<T, WarrantyError>) {
    match result {
        Err(err) if err.is_conflict() => {}
        other => panic!("Expected a conflict, got {:?}", other),
    }
}

pub fn assert_forbidden<T: Debug>(result: &Result<T, WarrantyError>) {
    assert!(
        matches!(result, Err(WarrantyError::Forbidden(_))),
        "Expected Forbidden, got {:?}",
        result
    );
}

pub fn assert_not_found<T: Debug>(result: &Result<T, WarrantyError>) {
    let found = match result {
        Err(WarrantyError::NotFound { .. }) => true,
        Err(WarrantyError::Store(port)) => port.is_not_found(),
        _ => false,
    };
    assert!(found, "Expected NotFound, got {:?}", result);
}

pub fn assert_validation<T: Debug>(result: &Result<T, WarrantyError>) {
    assert!(
        matches!(result, Err(WarrantyError::Validation(_))),
        "Expected a validation error, got {:?}",
        result
    );
}

/// Asserts a rejected transition and returns the statuses that were allowed
pub fn assert_invalid_transition<T: Debug>(
    result: &Result<T, WarrantyError>,
    expected_from: &str,
    expected_to: &str,
) -> Vec<String> {
    match result {
        Err(WarrantyError::InvalidTransition { from, to, allowed, .. }) => {
            assert_eq!(from, expected_from, "transition source");
            assert_eq!(to, expected_to, "transition target");
            allowed.clone()
        }
        other => panic!(
            "Expected invalid transition {} -> {}, got {:?}",
            expected_from, expected_to, other
        ),
    }
}

/// Asserts that the response links a claim exactly when it is IN_PROGRESS or COMPLETED
pub fn assert_claim_link_consistent(response: &RecallResponse) {
    assert!(
        response.has_consistent_claim_link(),
        "Response {} is {} with claim link {:?}",
        response.id,
        response.status,
        response.warranty_claim_id
    );
}

/// Asserts that a recall response and its claim point at each other
pub fn assert_recall_linked(response: &RecallResponse, claim: &WarrantyClaim) {
    assert_eq!(response.warranty_claim_id, Some(claim.id), "response -> claim link");
    assert_eq!(claim.recall_response_id, Some(response.id), "claim -> response link");
    assert_eq!(claim.vehicle_id, response.vehicle_id, "vehicle mismatch");
}

/// Asserts that a paid warranty fee lies within the part's ratio band of the repair cost
pub fn assert_fee_within(fee: Decimal, repair_cost: Decimal, min_ratio: Decimal, max_ratio: Decimal) {
    let low = repair_cost * min_ratio;
    let high = repair_cost * max_ratio;
    assert!(
        fee >= low && fee <= high,
        "Fee {} outside [{}, {}] for repair cost {}",
        fee,
        low,
        high,
        repair_cost
    );
}

pub fn assert_page_shape<T>(page: &Page<T>, expected_len: usize, expected_total: u64) {
    assert_eq!(page.content.len(), expected_len, "page length");
    assert_eq!(page.total_elements, expected_total, "total elements");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conflict_accepts_conflict_variant() {
        let result: Result<(), WarrantyError> = Err(WarrantyError::conflict("already approved"));
        assert_conflict(&result);
    }

    #[test]
    #[should_panic(expected = "Expected Forbidden")]
    fn test_forbidden_rejects_ok() {
        assert_forbidden(&Ok::<_, WarrantyError>(1));
    }

    #[test]
    fn test_invalid_transition_returns_allowed() {
        let result: Result<(), WarrantyError> = Err(WarrantyError::InvalidTransition {
            entity: "WarrantyClaim",
            from: "SUBMITTED".into(),
            to: "COMPLETED".into(),
            allowed: vec!["MANAGER_REVIEW".into(), "REJECTED".into()],
        });
        let allowed = assert_invalid_transition(&result, "SUBMITTED", "COMPLETED");
        assert_eq!(allowed, vec!["MANAGER_REVIEW", "REJECTED"]);
    }

    #[test]
    fn test_fee_band() {
        assert_fee_within(dec!(3000000), dec!(10000000), dec!(0.20), dec!(0.50));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_fee_band_rejects_overcharge() {
        assert_fee_within(dec!(6000000), dec!(10000000), dec!(0.20), dec!(0.50));
    }
}
