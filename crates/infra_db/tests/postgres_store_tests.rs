//! PostgreSQL store integration tests
//!
//! Each test starts its own container. Run with
//! `cargo test -p infra_db -- --ignored` on a machine with Docker.

use std::sync::Arc;

use core_kernel::{AdapterHealth, Clock, FixedClock, HealthCheckable, PageRequest, SortDirection};
use domain_warranty::{
    ClaimFilter, ClaimService, Feedback, FeedbackFilter, NewCampaign, NewClaim, Rating,
    RecallCampaignService, RecallRequest, RecallRequestStatus, RecallResponse, RecallResponseService,
    RecallResponseStatus, WarrantyClaim, WarrantyClaimStatus, WarrantyStore, WorkLog, WorkLogFilter,
};
use infra_db::{run_migrations, PostgresWarrantyStore};
use test_utils::{
    assert_claim_link_consistent, assert_conflict, assert_recall_linked, create_isolated_test_database,
    ActorFixtures, ClaimBuilder, FleetScenario, TemporalFixtures, TestDatabase,
};

struct Harness {
    _db: TestDatabase,
    store: Arc<PostgresWarrantyStore>,
    clock: Arc<FixedClock>,
}

impl Harness {
    async fn start() -> Self {
        let db = create_isolated_test_database().await.expect("container");
        run_migrations(db.pool()).await.expect("migrations");
        let store = Arc::new(PostgresWarrantyStore::new(db.pool().clone()));
        Self {
            _db: db,
            store,
            clock: Arc::new(TemporalFixtures::clock()),
        }
    }

    fn dyn_store(&self) -> Arc<dyn WarrantyStore> {
        self.store.clone()
    }

    fn claims(&self) -> ClaimService {
        ClaimService::new(self.dyn_store(), self.clock.clone(), TemporalFixtures::business_timezone())
    }

    fn campaigns(&self) -> RecallCampaignService {
        RecallCampaignService::new(self.dyn_store(), self.clock.clone())
    }

    fn responses(&self) -> RecallResponseService {
        RecallResponseService::new(self.dyn_store(), self.clock.clone())
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_health_check_reports_healthy() {
    let harness = Harness::start().await;
    let health = harness.store.health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_recall_flow_persists_links() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Battery module", 2)
        .await
        .unwrap();
    let evm = ActorFixtures::evm_staff();

    let campaign = harness
        .campaigns()
        .create_campaign(
            &evm,
            NewCampaign {
                part_id: fleet.part.id,
                reason: "Cell overheating".into(),
                customer_note: None,
            },
        )
        .await
        .unwrap();
    let outcome = harness
        .campaigns()
        .approve_campaign(&ActorFixtures::admin(), campaign.id, None)
        .await
        .unwrap();
    assert_eq!(outcome.responses_created, 2);
    assert_eq!(outcome.campaign.status, RecallRequestStatus::WaitingCustomerConfirm);

    let responses = harness.store.responses_for_campaign(campaign.id).await.unwrap();
    let first = fleet.member(0);
    let response = responses
        .iter()
        .find(|r| r.vehicle_id == first.vehicle.id)
        .unwrap();

    let accepted = harness
        .responses()
        .customer_confirm(&first.owner, response.id, true, Some("Saturday".into()))
        .await
        .unwrap();
    assert_eq!(accepted.status, RecallResponseStatus::InProgress);
    assert_claim_link_consistent(&accepted);

    let claim = harness.store.get_claim(accepted.warranty_claim_id.unwrap()).await.unwrap();
    assert_recall_linked(&accepted, &claim);
    assert_eq!(claim.status, WarrantyClaimStatus::Submitted);
    assert!(claim.description.starts_with("RECALL: Cell overheating"));

    let reloaded = harness.store.get_campaign(campaign.id).await.unwrap();
    assert_eq!(reloaded.status, RecallRequestStatus::ClaimCreated);

    let again = harness
        .responses()
        .customer_confirm(&first.owner, response.id, true, None)
        .await;
    assert_conflict(&again);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_second_approval_creates_no_duplicates() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Charger", 3).await.unwrap();
    let campaign = harness
        .campaigns()
        .create_campaign(
            &ActorFixtures::evm_staff(),
            NewCampaign {
                part_id: fleet.part.id,
                reason: "Connector wear".into(),
                customer_note: None,
            },
        )
        .await
        .unwrap();

    let service = harness.campaigns();
    let admin = ActorFixtures::admin();
    let (a, b) = tokio::join!(
        service.approve_campaign(&admin, campaign.id, None),
        service.approve_campaign(&admin, campaign.id, None),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let retry = service.approve_campaign(&admin, campaign.id, None).await;
    assert_conflict(&retry);
    assert_eq!(harness.store.responses_for_campaign(campaign.id).await.unwrap().len(), 3);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_stale_claim_update_is_conflict() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Motor", 1).await.unwrap();
    let claim = ClaimBuilder::new(&fleet.member(0).installed).build();
    harness.store.insert_claim(&claim).await.unwrap();

    let mut reviewed = claim.clone();
    reviewed.status = WarrantyClaimStatus::ManagerReview;
    let stored = harness.store.update_claim(&reviewed, 0).await.unwrap();
    assert_eq!(stored.version, 1);

    let err = harness.store.update_claim(&reviewed, 0).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(harness.store.delete_claim(claim.id, 0).await.unwrap_err().is_conflict());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_claims_page_and_filter() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Inverter", 3).await.unwrap();
    let claims = harness.claims();
    for member in &fleet.members {
        claims
            .submit_claim(
                &ActorFixtures::sc_staff(),
                NewClaim {
                    vehicle_id: member.vehicle.id,
                    installed_part_id: member.installed.id,
                    description: "Inverter fault code P0A94".into(),
                    is_paid_warranty: false,
                    warranty_fee: None,
                },
            )
            .await
            .unwrap();
    }

    let page = PageRequest::new(0, 2).sorted_by("claimDate", SortDirection::Desc);
    let first = claims.list_claims(&ClaimFilter::default(), &page).await.unwrap();
    assert_eq!(first.content.len(), 2);
    assert_eq!(first.total_elements, 3);
    assert_eq!(first.total_pages, 2);

    let reviewed = claims
        .list_claims(&ClaimFilter::by_status(WarrantyClaimStatus::ManagerReview), &PageRequest::new(0, 10))
        .await
        .unwrap();
    assert!(reviewed.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_acceptance_rolls_back_claim_insert() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Battery module", 1)
        .await
        .unwrap();
    let campaign = harness
        .campaigns()
        .create_campaign(
            &ActorFixtures::evm_staff(),
            NewCampaign {
                part_id: fleet.part.id,
                reason: "Cell overheating".into(),
                customer_note: None,
            },
        )
        .await
        .unwrap();
    harness
        .campaigns()
        .approve_campaign(&ActorFixtures::admin(), campaign.id, None)
        .await
        .unwrap();

    let member = fleet.member(0);
    let mut response = harness.store.responses_for_campaign(campaign.id).await.unwrap().remove(0);
    let read_version = response.version;
    let now = harness.clock.now();
    let claim = WarrantyClaim::for_recall(response.id, member.vehicle.id, member.installed.id, &campaign.reason, now);
    response.accept(None, claim.id, now).unwrap();

    // The claim row is written before the response update fails its version check
    let err = harness
        .store
        .commit_acceptance(&response, read_version + 1, &claim)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let stored = harness.store.get_response(response.id).await.unwrap();
    assert_eq!(stored.status, RecallResponseStatus::Pending);
    assert_eq!(stored.warranty_claim_id, None);
    assert!(harness.store.get_claim(claim.id).await.unwrap_err().is_not_found());
    assert_eq!(
        harness.store.get_campaign(campaign.id).await.unwrap().status,
        RecallRequestStatus::WaitingCustomerConfirm
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_failed_fan_out_rolls_back_campaign_update() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Charger", 1).await.unwrap();
    let now = harness.clock.now();
    let admin = ActorFixtures::admin();

    let mut campaign = RecallRequest::new(fleet.part.id, "Connector wear", admin.user_id, now);
    harness.store.insert_campaign(&campaign).await.unwrap();
    campaign.approve(admin.user_id, None, now).unwrap();
    campaign.begin_customer_confirmation(now).unwrap();

    // Same vehicle twice: the second insert hits the (campaign, vehicle) constraint
    let vehicle_id = fleet.member(0).vehicle.id;
    let responses = vec![
        RecallResponse::pending(campaign.id, vehicle_id, now),
        RecallResponse::pending(campaign.id, vehicle_id, now),
    ];

    let err = harness
        .store
        .commit_fan_out(&campaign, 0, &responses)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let stored = harness.store.get_campaign(campaign.id).await.unwrap();
    assert_eq!(stored.status, RecallRequestStatus::PendingAdminApproval);
    assert_eq!(stored.version, 0);
    assert!(harness.store.responses_for_campaign(campaign.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_feedback_and_work_logs_persist() {
    let harness = Harness::start().await;
    let fleet = FleetScenario::seed(harness.store.as_ref(), "Charger", 1).await.unwrap();
    let member = fleet.member(0);
    let claim = ClaimBuilder::new(&member.installed)
        .in_status(WarrantyClaimStatus::Completed)
        .build();
    harness.store.insert_claim(&claim).await.unwrap();
    let now = harness.clock.now();

    let customer_id = member.owner.customer_id.unwrap();
    let feedback = Feedback::new(&claim, customer_id, Rating::new(4).unwrap(), Some("Quick".into()), now).unwrap();
    harness.store.insert_feedback(&feedback).await.unwrap();
    assert_eq!(harness.store.feedback_for_claim(claim.id).await.unwrap(), Some(feedback.clone()));

    let duplicate = Feedback::new(&claim, customer_id, Rating::new(1).unwrap(), None, now).unwrap();
    assert!(harness.store.insert_feedback(&duplicate).await.unwrap_err().is_conflict());

    let mut revised = feedback.clone();
    revised.revise(Rating::new(5).unwrap(), None, now).unwrap();
    let stored = harness.store.update_feedback(&revised, 0).await.unwrap();
    assert_eq!(stored.version, 1);
    assert!(harness.store.update_feedback(&revised, 0).await.unwrap_err().is_conflict());

    let summary = harness.store.feedback_summary().await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.counts_by_rating, [0, 0, 0, 0, 1]);
    let page = harness
        .store
        .list_feedback(&FeedbackFilter::for_customer(customer_id), &PageRequest::new(0, 10))
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);

    let technician = ActorFixtures::technician().user_id;
    let log = WorkLog::new(claim.id, technician, now, Some(now + chrono::Duration::hours(1)), None, now).unwrap();
    harness.store.insert_work_log(&log).await.unwrap();
    let logs = harness
        .store
        .list_work_logs(
            &WorkLogFilter {
                technician: Some(technician),
                ..Default::default()
            },
            &PageRequest::new(0, 10),
        )
        .await
        .unwrap();
    assert_eq!(logs.content, vec![log.clone()]);

    assert!(harness.store.delete_claim(claim.id, claim.version).await.unwrap_err().is_conflict());

    harness.store.delete_work_log(log.id, 0).await.unwrap();
    harness.store.delete_feedback(feedback.id, 1).await.unwrap();
    harness.store.delete_claim(claim.id, claim.version).await.unwrap();
}
