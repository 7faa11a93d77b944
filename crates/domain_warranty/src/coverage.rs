//! Warranty coverage assessment
//!
//! Decides whether a failed part is repaired for free, only as a paid
//! warranty, or not at all. Vehicle coverage ends at the vehicle's warranty
//! end date or at 100,000 km. Parts with extended warranty are also checked
//! against their own expiration date and the distance driven since
//! installation, and the stricter of the two results applies.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::WarrantyError;
use crate::fleet::{InstalledPart, Part, Vehicle};

/// Odometer limit of the vehicle-level warranty
pub const VEHICLE_MILEAGE_LIMIT_KM: i64 = 100_000;

/// Days after expiry during which a paid warranty is still offered
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 180;

/// Minimum fee for a paid warranty claim
pub const BASE_PAID_FEE: Decimal = dec!(500000);

const DEFAULT_MIN_FEE_RATIO: Decimal = dec!(0.20);
const DEFAULT_MAX_FEE_RATIO: Decimal = dec!(0.50);

/// Coverage state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarrantyStatus {
    Valid,
    ExpiredDate,
    ExpiredMileage,
    ExpiredBoth,
}

impl WarrantyStatus {
    fn from_flags(date_expired: bool, mileage_expired: bool) -> Self {
        match (date_expired, mileage_expired) {
            (false, false) => WarrantyStatus::Valid,
            (true, false) => WarrantyStatus::ExpiredDate,
            (false, true) => WarrantyStatus::ExpiredMileage,
            (true, true) => WarrantyStatus::ExpiredBoth,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, WarrantyStatus::Valid)
    }

    pub fn date_expired(&self) -> bool {
        matches!(self, WarrantyStatus::ExpiredDate | WarrantyStatus::ExpiredBoth)
    }

    pub fn mileage_expired(&self) -> bool {
        matches!(self, WarrantyStatus::ExpiredMileage | WarrantyStatus::ExpiredBoth)
    }

    /// Combines part and vehicle results; any expiry on either side counts
    pub fn strictest(self, other: WarrantyStatus) -> WarrantyStatus {
        WarrantyStatus::from_flags(
            self.date_expired() || other.date_expired(),
            self.mileage_expired() || other.mileage_expired(),
        )
    }
}

/// What kind of claim may be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimOption {
    Free,
    PaidOnly,
    Ineligible,
}

/// Result of checking one installed part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageAssessment {
    pub status: WarrantyStatus,
    /// The earlier of the applicable end dates
    pub warranty_end_date: NaiveDate,
    /// Negative once the end date has passed
    pub days_remaining: i64,
    pub mileage_limit_km: i64,
    /// Negative once the limit has been exceeded
    pub mileage_remaining_km: i64,
    pub grace_period_days: i64,
}

impl CoverageAssessment {
    pub fn days_expired(&self) -> i64 {
        (-self.days_remaining).max(0)
    }

    pub fn claim_option(&self) -> ClaimOption {
        if self.status.is_valid() {
            ClaimOption::Free
        } else if self.days_expired() <= self.grace_period_days {
            ClaimOption::PaidOnly
        } else {
            ClaimOption::Ineligible
        }
    }

    /// Suggested paid-warranty fee, scaled from the part's minimum to maximum
    /// ratio of the repair cost as the grace period runs out.
    ///
    /// Returns `None` unless the claim can only be opened as a paid warranty,
    /// and a validation error when the cost is too large to price.
    pub fn estimate_paid_fee(
        &self,
        part: &Part,
        estimated_repair_cost: Option<Decimal>,
    ) -> Result<Option<Decimal>, WarrantyError> {
        if self.claim_option() != ClaimOption::PaidOnly {
            return Ok(None);
        }

        let cost = match estimated_repair_cost {
            Some(cost) if cost > Decimal::ZERO => cost,
            _ => return Ok(Some(BASE_PAID_FEE)),
        };

        let min_ratio = part.paid_fee_min_ratio.unwrap_or(DEFAULT_MIN_FEE_RATIO);
        let max_ratio = part.paid_fee_max_ratio.unwrap_or(DEFAULT_MAX_FEE_RATIO);
        let progress = if self.grace_period_days > 0 {
            (Decimal::from(self.days_expired()) / Decimal::from(self.grace_period_days)).round_dp(4)
        } else {
            Decimal::ZERO
        };

        let fee = (max_ratio - min_ratio)
            .checked_mul(progress)
            .and_then(|spread| spread.checked_add(min_ratio))
            .and_then(|ratio| cost.checked_mul(ratio))
            .ok_or_else(|| WarrantyError::validation(format!("estimated repair cost {} is out of range", cost)))?;
        Ok(Some(fee.max(BASE_PAID_FEE)))
    }
}

/// Assesses coverage of an installed part on `today` (a business-timezone date)
pub fn assess_coverage(
    vehicle: &Vehicle,
    installed: &InstalledPart,
    part: &Part,
    today: NaiveDate,
) -> CoverageAssessment {
    let vehicle_days = (vehicle.warranty_end_date - today).num_days();
    let vehicle_mileage_remaining = VEHICLE_MILEAGE_LIMIT_KM - vehicle.mileage_km;
    let vehicle_status = WarrantyStatus::from_flags(
        today > vehicle.warranty_end_date,
        vehicle.mileage_km > VEHICLE_MILEAGE_LIMIT_KM,
    );

    if !part.has_extended_warranty {
        return CoverageAssessment {
            status: vehicle_status,
            warranty_end_date: vehicle.warranty_end_date,
            days_remaining: vehicle_days,
            mileage_limit_km: VEHICLE_MILEAGE_LIMIT_KM,
            mileage_remaining_km: vehicle_mileage_remaining,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        };
    }

    let driven_since_install = vehicle.mileage_km - installed.mileage_at_installation_km.unwrap_or(0);
    let part_limit = installed
        .warranty_mileage_limit_km
        .or(part.default_warranty_mileage_km);
    let part_days = (installed.warranty_expiration_date - today).num_days();
    let part_status = WarrantyStatus::from_flags(
        today > installed.warranty_expiration_date,
        part_limit.is_some_and(|limit| driven_since_install > limit),
    );

    let (warranty_end_date, days_remaining) = if part_days <= vehicle_days {
        (installed.warranty_expiration_date, part_days)
    } else {
        (vehicle.warranty_end_date, vehicle_days)
    };

    let (mileage_limit_km, mileage_remaining_km) = match part_limit {
        Some(limit) if limit - driven_since_install <= vehicle_mileage_remaining => {
            (limit, limit - driven_since_install)
        }
        _ => (VEHICLE_MILEAGE_LIMIT_KM, vehicle_mileage_remaining),
    };

    CoverageAssessment {
        status: part_status.strictest(vehicle_status),
        warranty_end_date,
        days_remaining,
        mileage_limit_km,
        mileage_remaining_km,
        grace_period_days: part.grace_period_days.unwrap_or(DEFAULT_GRACE_PERIOD_DAYS),
    }
}
