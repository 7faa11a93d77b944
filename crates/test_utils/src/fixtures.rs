//! Pre-built Test Fixtures
//!
//! Ready-to-use dates, identifiers, actors, and amounts. Every fixture is
//! deterministic so tests can compare against literal values.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{ClaimId, CustomerId, FixedClock, PartId, Timezone, UserId, VehicleId};
use domain_warranty::{Actor, Role};

/// Fixture for temporal test data
///
/// The reference instant is 2025-03-01 10:00 in Ho Chi Minh City, so the
/// business date and the UTC date agree.
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
    }

    /// 2025-03-01T03:00:00Z
    pub fn reference_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()
    }

    /// Business date at the reference instant
    pub fn today() -> NaiveDate {
        Self::date(2025, 3, 1)
    }

    /// 2025-02-28 18:00 UTC is already 2025-03-01 01:00 in Ho Chi Minh City
    pub fn late_evening_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 28, 18, 0, 0).unwrap()
    }

    pub fn purchase_date() -> NaiveDate {
        Self::date(2022, 1, 1)
    }

    /// A warranty end date far in the future
    pub fn covered_until() -> NaiveDate {
        Self::date(2030, 1, 1)
    }

    /// A warranty end date `days` before the reference date
    pub fn expired_days_ago(days: i64) -> NaiveDate {
        Self::today() - chrono::Duration::days(days)
    }

    pub fn business_timezone() -> Timezone {
        Timezone::vietnam()
    }

    pub fn clock() -> FixedClock {
        FixedClock::new(Self::reference_instant())
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    fn uuid(suffix: u8) -> Uuid {
        Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440000 + suffix as u128)
    }

    pub fn claim_id() -> ClaimId {
        ClaimId::from_uuid(Self::uuid(1))
    }

    pub fn vehicle_id() -> VehicleId {
        VehicleId::from_uuid(Self::uuid(2))
    }

    pub fn part_id() -> PartId {
        PartId::from_uuid(Self::uuid(3))
    }

    pub fn customer_id() -> CustomerId {
        CustomerId::from_uuid(Self::uuid(4))
    }

    pub fn admin_user_id() -> UserId {
        UserId::from_uuid(Self::uuid(10))
    }
}

/// Fixture for the actors of each role
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn admin() -> Actor {
        Actor::new(IdFixtures::admin_user_id(), [Role::Admin])
    }

    pub fn evm_staff() -> Actor {
        Actor::new(UserId::new(), [Role::EvmStaff])
    }

    pub fn sc_staff() -> Actor {
        Actor::new(UserId::new(), [Role::ScStaff])
    }

    pub fn technician() -> Actor {
        Actor::new(UserId::new(), [Role::ScTechnician])
    }

    /// A customer account linked to `customer_id`
    pub fn customer(customer_id: CustomerId) -> Actor {
        Actor::new(UserId::new(), [Role::Customer]).with_customer(customer_id)
    }
}

/// Fixture for amounts in VND
pub struct DecimalFixtures;

impl DecimalFixtures {
    pub fn repair_cost() -> Decimal {
        dec!(10000000)
    }

    pub fn paid_fee() -> Decimal {
        dec!(1500000)
    }

    /// Fee quoted when no repair cost estimate is available
    pub fn base_paid_fee() -> Decimal {
        dec!(500000)
    }

    pub fn min_fee_ratio() -> Decimal {
        dec!(0.20)
    }

    pub fn max_fee_ratio() -> Decimal {
        dec!(0.50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_instant_is_same_business_day() {
        let local = TemporalFixtures::business_timezone().today(TemporalFixtures::reference_instant());
        assert_eq!(local, TemporalFixtures::today());
    }

    #[test]
    fn test_late_evening_rolls_over() {
        let local = TemporalFixtures::business_timezone().today(TemporalFixtures::late_evening_utc());
        assert_eq!(local, TemporalFixtures::date(2025, 3, 1));
    }

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(IdFixtures::claim_id(), IdFixtures::claim_id());
        assert_ne!(IdFixtures::claim_id().as_uuid(), IdFixtures::vehicle_id().as_uuid());
    }
}
