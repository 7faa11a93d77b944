//! Property-Based Test Generators
//!
//! Proptest strategies for statuses, wire names, mileage, and money that
//! respect the domain's value ranges.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use proptest::sample::select;
use rust_decimal::Decimal;

use domain_warranty::{PartRequestStatus, RecallRequestStatus, RecallResponseStatus, WarrantyClaimStatus};

use crate::fixtures::TemporalFixtures;

pub fn claim_status_strategy() -> impl Strategy<Value = WarrantyClaimStatus> {
    select(WarrantyClaimStatus::ALL)
}

pub fn campaign_status_strategy() -> impl Strategy<Value = RecallRequestStatus> {
    select(RecallRequestStatus::ALL)
}

pub fn response_status_strategy() -> impl Strategy<Value = RecallResponseStatus> {
    select(RecallResponseStatus::ALL)
}

pub fn part_request_status_strategy() -> impl Strategy<Value = PartRequestStatus> {
    select(PartRequestStatus::ALL)
}

/// Re-cases a wire name character by character
pub fn mixed_case_strategy(wire: &'static str) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<bool>(), wire.len()).prop_map(move |upper| {
        wire.chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
            .collect()
    })
}

/// Odometer readings up to 300,000 km
pub fn mileage_strategy() -> impl Strategy<Value = i64> {
    0i64..300_000i64
}

/// Repair costs between 100,000 and 200,000,000 VND in whole dong
pub fn repair_cost_strategy() -> impl Strategy<Value = Decimal> {
    (100_000i64..200_000_000i64).prop_map(Decimal::from)
}

/// Warranty end dates within two years either side of the reference date
pub fn warranty_end_strategy() -> impl Strategy<Value = NaiveDate> {
    (-730i64..730i64).prop_map(|offset| TemporalFixtures::today() + Duration::days(offset))
}

/// Non-blank free text for descriptions and notes
pub fn description_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ,.]{4,60}"
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_mixed_case_preserves_letters(name in mixed_case_strategy("MANAGER_REVIEW")) {
            prop_assert_eq!(name.to_ascii_uppercase(), "MANAGER_REVIEW");
        }

        #[test]
        fn test_descriptions_are_not_blank(text in description_strategy()) {
            prop_assert!(!text.trim().is_empty());
        }

        #[test]
        fn test_repair_cost_positive(cost in repair_cost_strategy()) {
            prop_assert!(cost > Decimal::ZERO);
        }
    }
}
