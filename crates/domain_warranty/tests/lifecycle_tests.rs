//! Transition table properties
//!
//! Checked for every status enumeration: tables and validation agree, the
//! self-transition is a no-op, final states have no successors, and wire
//! names parse back case-insensitively.

use domain_warranty::{
    Lifecycle, PartRequestStatus, RecallRequestStatus, RecallResponseStatus, WarrantyClaimStatus,
    WarrantyError,
};
use proptest::prelude::*;
use std::fmt::Debug;
use std::str::FromStr;

fn any_status<S: Lifecycle>() -> impl Strategy<Value = S> {
    proptest::sample::select(S::all().to_vec())
}

fn check_pair<S: Lifecycle>(from: S, to: S) -> Result<(), TestCaseError> {
    let listed = from.allowed_next().contains(&to);
    let valid = S::is_valid_transition(from, to);

    prop_assert_eq!(valid, from == to || listed);
    match S::validate_transition(from, to) {
        Ok(()) => prop_assert!(valid),
        Err(err) => {
            prop_assert!(!valid);
            prop_assert_eq!(err.from, from);
            prop_assert_eq!(err.to, to);
            prop_assert_eq!(err.allowed, from.allowed_next().to_vec());
        }
    }
    Ok(())
}

fn check_wire_name<S>(status: S) -> Result<(), TestCaseError>
where
    S: Lifecycle + FromStr + Debug,
    <S as FromStr>::Err: Debug,
{
    let wire = status.as_wire();
    prop_assert_eq!(wire.parse::<S>().ok(), Some(status));
    prop_assert_eq!(wire.to_lowercase().parse::<S>().ok(), Some(status));
    Ok(())
}

proptest! {
    #[test]
    fn claim_table_agrees_with_validation(from in any_status::<WarrantyClaimStatus>(), to in any_status::<WarrantyClaimStatus>()) {
        check_pair(from, to)?;
    }

    #[test]
    fn recall_request_table_agrees_with_validation(from in any_status::<RecallRequestStatus>(), to in any_status::<RecallRequestStatus>()) {
        check_pair(from, to)?;
    }

    #[test]
    fn recall_response_table_agrees_with_validation(from in any_status::<RecallResponseStatus>(), to in any_status::<RecallResponseStatus>()) {
        check_pair(from, to)?;
    }

    #[test]
    fn part_request_table_agrees_with_validation(from in any_status::<PartRequestStatus>(), to in any_status::<PartRequestStatus>()) {
        check_pair(from, to)?;
    }

    #[test]
    fn wire_names_parse_back(
        claim in any_status::<WarrantyClaimStatus>(),
        campaign in any_status::<RecallRequestStatus>(),
        response in any_status::<RecallResponseStatus>(),
        part_request in any_status::<PartRequestStatus>(),
    ) {
        check_wire_name(claim)?;
        check_wire_name(campaign)?;
        check_wire_name(response)?;
        check_wire_name(part_request)?;
    }

    #[test]
    fn unknown_names_never_parse(name in "[A-Z_]{1,20}") {
        prop_assume!(!WarrantyClaimStatus::ALL.iter().any(|s| s.as_str() == name));
        prop_assume!(name != "SC_REVIEW");
        prop_assert!(name.parse::<WarrantyClaimStatus>().is_err());
    }
}

mod tables {
    use super::*;

    #[test]
    fn test_claim_final_states() {
        let finals: Vec<_> = WarrantyClaimStatus::ALL.iter().copied().filter(|s| s.is_final()).collect();
        assert_eq!(finals, vec![WarrantyClaimStatus::Completed, WarrantyClaimStatus::Rejected]);
    }

    #[test]
    fn test_claim_happy_path() {
        use WarrantyClaimStatus::*;
        for (from, to) in [(Submitted, ManagerReview), (ManagerReview, Processing), (Processing, Completed)] {
            assert!(WarrantyClaimStatus::is_valid_transition(from, to), "{from} -> {to}");
        }
        assert!(!WarrantyClaimStatus::is_valid_transition(Submitted, Completed));
        assert!(!WarrantyClaimStatus::is_valid_transition(Completed, Processing));
    }

    #[test]
    fn test_review_alias_parses_to_manager_review() {
        assert_eq!(
            "sc_review".parse::<WarrantyClaimStatus>().unwrap(),
            WarrantyClaimStatus::ManagerReview
        );
        assert_eq!(WarrantyClaimStatus::ManagerReview.as_str(), "MANAGER_REVIEW");
    }

    #[test]
    fn test_response_declined_and_completed_are_final() {
        assert!(RecallResponseStatus::Declined.is_final());
        assert!(RecallResponseStatus::Completed.is_final());
        assert!(!RecallResponseStatus::Pending.is_final());
    }

    #[test]
    fn test_campaign_claim_created_is_final() {
        assert!(RecallRequestStatus::ClaimCreated.is_final());
        assert!(RecallRequestStatus::RejectedByAdmin.is_final());
        assert_eq!(
            RecallRequestStatus::PendingAdminApproval.allowed_next(),
            &[RecallRequestStatus::ApprovedByAdmin, RecallRequestStatus::RejectedByAdmin]
        );
    }

    #[test]
    fn test_invalid_transition_message_lists_allowed() {
        let err = WarrantyClaimStatus::validate_transition(
            WarrantyClaimStatus::Submitted,
            WarrantyClaimStatus::Completed,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("from SUBMITTED to COMPLETED"), "{message}");
        assert!(message.contains("MANAGER_REVIEW"), "{message}");

        let converted: WarrantyError = err.into();
        assert!(matches!(converted, WarrantyError::InvalidTransition { .. }));
    }

    #[test]
    fn test_unknown_status_is_a_validation_error() {
        let err = "ARCHIVED".parse::<RecallResponseStatus>().unwrap_err();
        assert_eq!(err.value, "ARCHIVED");
        let converted: WarrantyError = err.into();
        assert!(matches!(converted, WarrantyError::Validation(_)));
    }
}
