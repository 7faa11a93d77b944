//! Vehicles, part types, and part installations
//!
//! Read-side data the lifecycles need: who owns a vehicle, which parts are
//! installed on it, and when their warranties end.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, InstalledPartId, PartId, VehicleId};

/// A customer's vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vin: String,
    pub model: String,
    pub customer_id: CustomerId,
    /// Odometer reading in kilometres
    pub mileage_km: i64,
    pub purchase_date: NaiveDate,
    pub warranty_start_date: NaiveDate,
    pub warranty_end_date: NaiveDate,
}

/// A part type in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub part_number: String,
    pub name: String,
    /// Parts such as traction batteries carry their own warranty terms
    pub has_extended_warranty: bool,
    pub default_warranty_mileage_km: Option<i64>,
    pub grace_period_days: Option<i64>,
    /// Fraction of the repair cost charged at the start of the grace period
    pub paid_fee_min_ratio: Option<Decimal>,
    /// Fraction of the repair cost charged at the end of the grace period
    pub paid_fee_max_ratio: Option<Decimal>,
}

/// One physical part installed on a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPart {
    pub id: InstalledPartId,
    pub part_id: PartId,
    pub vehicle_id: VehicleId,
    pub installation_date: NaiveDate,
    pub mileage_at_installation_km: Option<i64>,
    pub warranty_expiration_date: NaiveDate,
    /// Overrides the part's default mileage limit
    pub warranty_mileage_limit_km: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl InstalledPart {
    pub fn is_on(&self, vehicle_id: VehicleId) -> bool {
        self.vehicle_id == vehicle_id
    }
}
