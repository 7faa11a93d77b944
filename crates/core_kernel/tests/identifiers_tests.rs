//! Integration tests for the identifier types

use core_kernel::{
    ClaimId, CustomerId, InstalledPartId, PartId, PartRequestId, RecallRequestId,
    RecallResponseId, UserId, VehicleId,
};
use std::collections::BTreeSet;
use uuid::Uuid;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ClaimId::new(), ClaimId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let first = ClaimId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = ClaimId::new_v7();
        assert!(first < second);
    }

    #[test]
    fn test_from_str_with_and_without_prefix() {
        let original = ClaimId::new();
        let prefixed: ClaimId = original.to_string().parse().unwrap();
        let bare: ClaimId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, prefixed);
        assert_eq!(original, bare);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("CLM-not-a-uuid".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid = Uuid::new_v4();
        let id = ClaimId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

#[test]
fn test_prefixes() {
    assert_eq!(ClaimId::prefix(), "CLM");
    assert_eq!(RecallRequestId::prefix(), "RCL");
    assert_eq!(RecallResponseId::prefix(), "RSP");
    assert_eq!(PartRequestId::prefix(), "PRQ");
    assert_eq!(VehicleId::prefix(), "VEH");
    assert_eq!(PartId::prefix(), "PRT");
    assert_eq!(InstalledPartId::prefix(), "INP");
    assert_eq!(CustomerId::prefix(), "CUS");
    assert_eq!(UserId::prefix(), "USR");
}

#[test]
fn test_ids_order_in_sets() {
    let ids: BTreeSet<VehicleId> = (0..5).map(|_| VehicleId::new()).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_other_prefix_is_not_stripped() {
    let uuid = Uuid::new_v4();
    let foreign = format!("VEH-{}", uuid);
    assert!(foreign.parse::<ClaimId>().is_err());
}
