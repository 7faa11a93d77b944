//! Shared setup for the service-level tests

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use core_kernel::{CustomerId, FixedClock, InstalledPartId, PartId, Timezone, UserId, VehicleId};
use domain_warranty::{
    Actor, ClaimService, FeedbackService, InstalledPart, InMemoryWarrantyStore, NewClaim, Part,
    PartRequestService, RecallCampaignService, RecallResponseService, Role, Vehicle, WarrantyClaim,
    WarrantyStore, WorkLogService,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2025-03-01 10:00 in Ho Chi Minh City
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()
}

pub struct World {
    pub store: Arc<InMemoryWarrantyStore>,
    pub clock: Arc<FixedClock>,
    pub claims: ClaimService,
    pub campaigns: RecallCampaignService,
    pub responses: RecallResponseService,
    pub part_requests: PartRequestService,
    pub feedback: FeedbackService,
    pub work_logs: WorkLogService,
    pub admin: Actor,
    pub evm: Actor,
    pub sc_staff: Actor,
    pub technician: Actor,
}

impl World {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryWarrantyStore::new());
        let clock = Arc::new(FixedClock::new(start_instant()));
        let dyn_store: Arc<dyn WarrantyStore> = store.clone();

        Self {
            claims: ClaimService::new(dyn_store.clone(), clock.clone(), Timezone::vietnam()),
            campaigns: RecallCampaignService::new(dyn_store.clone(), clock.clone()),
            responses: RecallResponseService::new(dyn_store.clone(), clock.clone()),
            part_requests: PartRequestService::new(dyn_store.clone(), clock.clone()),
            feedback: FeedbackService::new(dyn_store.clone(), clock.clone()),
            work_logs: WorkLogService::new(dyn_store, clock.clone()),
            store,
            clock,
            admin: Actor::new(UserId::new(), [Role::Admin]),
            evm: Actor::new(UserId::new(), [Role::EvmStaff]),
            sc_staff: Actor::new(UserId::new(), [Role::ScStaff]),
            technician: Actor::new(UserId::new(), [Role::ScTechnician]),
        }
    }

    pub async fn part(&self, name: &str) -> Part {
        let id = PartId::new();
        let part = Part {
            id,
            part_number: format!("PN-{}", id.as_uuid().simple()),
            name: name.to_string(),
            has_extended_warranty: false,
            default_warranty_mileage_km: None,
            grace_period_days: None,
            paid_fee_min_ratio: None,
            paid_fee_max_ratio: None,
        };
        self.store.save_part(&part).await.unwrap();
        part
    }

    /// A vehicle with its owner's actor
    pub async fn vehicle(&self, warranty_end_date: NaiveDate, mileage_km: i64) -> (Vehicle, Actor) {
        let customer_id = CustomerId::new();
        let id = VehicleId::new();
        let vehicle = Vehicle {
            id,
            vin: format!("VIN{}", id.as_uuid().simple()),
            model: "VF 8".to_string(),
            customer_id,
            mileage_km,
            purchase_date: date(2022, 1, 1),
            warranty_start_date: date(2022, 1, 1),
            warranty_end_date,
        };
        self.store.save_vehicle(&vehicle).await.unwrap();

        let owner = Actor::new(UserId::new(), [Role::Customer]).with_customer(customer_id);
        (vehicle, owner)
    }

    pub async fn covered_vehicle(&self) -> (Vehicle, Actor) {
        self.vehicle(date(2030, 1, 1), 20_000).await
    }

    pub async fn install(&self, vehicle: &Vehicle, part: &Part) -> InstalledPart {
        let installed = InstalledPart {
            id: InstalledPartId::new(),
            part_id: part.id,
            vehicle_id: vehicle.id,
            installation_date: vehicle.purchase_date,
            mileage_at_installation_km: Some(0),
            warranty_expiration_date: vehicle.warranty_end_date,
            warranty_mileage_limit_km: None,
            recorded_at: start_instant(),
        };
        self.store.save_installed_part(&installed).await.unwrap();
        installed
    }

    /// A free claim on a covered vehicle, taken through to COMPLETED
    pub async fn completed_claim(&self) -> (WarrantyClaim, Actor) {
        let part = self.part("Charger").await;
        let (vehicle, owner) = self.covered_vehicle().await;
        let installed = self.install(&vehicle, &part).await;
        let claim = self
            .claims
            .submit_claim(
                &self.sc_staff,
                NewClaim {
                    vehicle_id: vehicle.id,
                    installed_part_id: installed.id,
                    description: "Onboard charger trips".to_string(),
                    is_paid_warranty: false,
                    warranty_fee: None,
                },
            )
            .await
            .unwrap();
        self.claims.accept_claim(&self.evm, claim.id, None).await.unwrap();
        self.claims.start_processing(&self.technician, claim.id, None).await.unwrap();
        let completed = self.claims.complete_claim(&self.technician, claim.id, None).await.unwrap();
        (completed, owner)
    }
}
