//! Test Data Builders
//!
//! Builder patterns for constructing fleet data and claims with sensible
//! defaults. Tests set only the fields they care about.

use chrono::{DateTime, NaiveDate, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rust_decimal::Decimal;

use core_kernel::{CustomerId, InstalledPartId, PartId, RecallResponseId, UserId, VehicleId};
use domain_warranty::{InstalledPart, Part, Vehicle, WarrantyClaim, WarrantyClaimStatus};

use crate::fixtures::TemporalFixtures;

/// Builder for vehicles
pub struct VehicleBuilder {
    id: VehicleId,
    vin: Option<String>,
    model: String,
    customer_id: CustomerId,
    mileage_km: i64,
    purchase_date: NaiveDate,
    warranty_end_date: NaiveDate,
}

impl Default for VehicleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleBuilder {
    /// A vehicle covered until 2030 with 20,000 km on the odometer
    pub fn new() -> Self {
        Self {
            id: VehicleId::new(),
            vin: None,
            model: "VF 8".to_string(),
            customer_id: CustomerId::new(),
            mileage_km: 20_000,
            purchase_date: TemporalFixtures::purchase_date(),
            warranty_end_date: TemporalFixtures::covered_until(),
        }
    }

    pub fn owned_by(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn with_vin(mut self, vin: impl Into<String>) -> Self {
        self.vin = Some(vin.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_mileage(mut self, km: i64) -> Self {
        self.mileage_km = km;
        self
    }

    pub fn warranty_until(mut self, end: NaiveDate) -> Self {
        self.warranty_end_date = end;
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            id: self.id,
            vin: self
                .vin
                .unwrap_or_else(|| format!("VIN{}", self.id.as_uuid().simple()).to_uppercase()),
            model: self.model,
            customer_id: self.customer_id,
            mileage_km: self.mileage_km,
            purchase_date: self.purchase_date,
            warranty_start_date: self.purchase_date,
            warranty_end_date: self.warranty_end_date,
        }
    }
}

/// Builder for catalogue parts
pub struct PartBuilder {
    id: PartId,
    name: String,
    part_number: Option<String>,
    extended: bool,
    mileage_limit_km: Option<i64>,
    grace_period_days: Option<i64>,
    fee_ratios: Option<(Decimal, Decimal)>,
}

impl Default for PartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PartBuilder {
    pub fn new() -> Self {
        Self {
            id: PartId::new(),
            name: "Battery pack".to_string(),
            part_number: None,
            extended: false,
            mileage_limit_km: None,
            grace_period_days: None,
            fee_ratios: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_part_number(mut self, number: impl Into<String>) -> Self {
        self.part_number = Some(number.into());
        self
    }

    /// Marks the part as carrying its own warranty terms
    pub fn extended_warranty(mut self) -> Self {
        self.extended = true;
        self
    }

    pub fn with_mileage_limit(mut self, km: i64) -> Self {
        self.mileage_limit_km = Some(km);
        self
    }

    pub fn with_grace_period(mut self, days: i64) -> Self {
        self.grace_period_days = Some(days);
        self
    }

    pub fn with_fee_ratios(mut self, min: Decimal, max: Decimal) -> Self {
        self.fee_ratios = Some((min, max));
        self
    }

    pub fn build(self) -> Part {
        Part {
            id: self.id,
            part_number: self
                .part_number
                .unwrap_or_else(|| format!("PN-{}", self.id.as_uuid().simple())),
            name: self.name,
            has_extended_warranty: self.extended,
            default_warranty_mileage_km: self.mileage_limit_km,
            grace_period_days: self.grace_period_days,
            paid_fee_min_ratio: self.fee_ratios.map(|(min, _)| min),
            paid_fee_max_ratio: self.fee_ratios.map(|(_, max)| max),
        }
    }
}

/// Builder for a part installed on a vehicle
///
/// The installation inherits the vehicle's purchase date and warranty end
/// unless overridden.
pub struct InstalledPartBuilder {
    part_id: PartId,
    vehicle_id: VehicleId,
    installation_date: NaiveDate,
    warranty_expiration_date: NaiveDate,
    mileage_limit_km: Option<i64>,
}

impl InstalledPartBuilder {
    pub fn new(vehicle: &Vehicle, part: &Part) -> Self {
        Self {
            part_id: part.id,
            vehicle_id: vehicle.id,
            installation_date: vehicle.purchase_date,
            warranty_expiration_date: vehicle.warranty_end_date,
            mileage_limit_km: None,
        }
    }

    pub fn installed_on(mut self, date: NaiveDate) -> Self {
        self.installation_date = date;
        self
    }

    pub fn expires_on(mut self, date: NaiveDate) -> Self {
        self.warranty_expiration_date = date;
        self
    }

    pub fn with_mileage_limit(mut self, km: i64) -> Self {
        self.mileage_limit_km = Some(km);
        self
    }

    pub fn build(self) -> InstalledPart {
        InstalledPart {
            id: InstalledPartId::new(),
            part_id: self.part_id,
            vehicle_id: self.vehicle_id,
            installation_date: self.installation_date,
            mileage_at_installation_km: Some(0),
            warranty_expiration_date: self.warranty_expiration_date,
            warranty_mileage_limit_km: self.mileage_limit_km,
            recorded_at: TemporalFixtures::reference_instant(),
        }
    }
}

/// Builder for warranty claims
///
/// Produces the aggregate directly, bypassing the coverage checks the claim
/// service applies. Useful for seeding a store in a given status.
pub struct ClaimBuilder {
    vehicle_id: VehicleId,
    installed_part_id: InstalledPartId,
    description: Option<String>,
    status: WarrantyClaimStatus,
    fee: Option<Decimal>,
    recall_response_id: Option<RecallResponseId>,
    created_by: Option<UserId>,
    at: DateTime<Utc>,
}

impl ClaimBuilder {
    pub fn new(installed: &InstalledPart) -> Self {
        Self {
            vehicle_id: installed.vehicle_id,
            installed_part_id: installed.id,
            description: None,
            status: WarrantyClaimStatus::Submitted,
            fee: None,
            recall_response_id: None,
            created_by: None,
            at: TemporalFixtures::reference_instant(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_status(mut self, status: WarrantyClaimStatus) -> Self {
        self.status = status;
        self
    }

    /// A paid claim; starts in PENDING_PAYMENT unless a status is set
    pub fn paid(mut self, fee: Decimal) -> Self {
        self.fee = Some(fee);
        if self.status == WarrantyClaimStatus::Submitted {
            self.status = WarrantyClaimStatus::PendingPayment;
        }
        self
    }

    pub fn from_recall(mut self, response_id: RecallResponseId) -> Self {
        self.recall_response_id = Some(response_id);
        self
    }

    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn build(self) -> WarrantyClaim {
        let description = self.description.unwrap_or_else(|| Sentence(3..8).fake());
        let mut claim = WarrantyClaim::submitted(
            self.vehicle_id,
            self.installed_part_id,
            description,
            self.created_by,
            self.at,
        );
        if let Some(fee) = self.fee {
            claim.is_paid_warranty = true;
            claim.warranty_fee = Some(fee);
        }
        claim.recall_response_id = self.recall_response_id;
        claim.status = self.status;
        claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_vehicle_defaults_are_covered() {
        let vehicle = VehicleBuilder::new().build();
        assert!(vehicle.vin.starts_with("VIN"));
        assert_eq!(vehicle.warranty_end_date, TemporalFixtures::covered_until());
        assert_eq!(vehicle.warranty_start_date, vehicle.purchase_date);
    }

    #[test]
    fn test_installation_inherits_vehicle_warranty() {
        let vehicle = VehicleBuilder::new()
            .warranty_until(TemporalFixtures::expired_days_ago(10))
            .build();
        let part = PartBuilder::new().build();
        let installed = InstalledPartBuilder::new(&vehicle, &part).build();

        assert!(installed.is_on(vehicle.id));
        assert_eq!(installed.warranty_expiration_date, vehicle.warranty_end_date);
    }

    #[test]
    fn test_paid_claim_waits_for_payment() {
        let vehicle = VehicleBuilder::new().build();
        let part = PartBuilder::new().with_fee_ratios(dec!(0.1), dec!(0.3)).build();
        let installed = InstalledPartBuilder::new(&vehicle, &part).build();
        let claim = ClaimBuilder::new(&installed).paid(dec!(750000)).build();

        assert_eq!(claim.status, WarrantyClaimStatus::PendingPayment);
        assert!(claim.is_paid_warranty);
        assert!(!claim.description.is_empty());
        assert_eq!(part.paid_fee_max_ratio, Some(dec!(0.3)));
    }
}
