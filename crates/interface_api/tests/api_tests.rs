//! HTTP tests over the in-memory store

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::FixedClock;
use domain_warranty::{Actor, InMemoryWarrantyStore, WarrantyClaimStatus, WarrantyStore};
use interface_api::{auth::create_token, config::ApiConfig, create_router, AppState};
use test_utils::{ActorFixtures, ClaimBuilder, FleetScenario, TemporalFixtures, VehicleBuilder};

const SECRET: &str = "api-test-secret";

struct Api {
    server: TestServer,
    store: Arc<InMemoryWarrantyStore>,
}

impl Api {
    fn start() -> Self {
        let store = Arc::new(InMemoryWarrantyStore::new());
        let clock = Arc::new(FixedClock::new(TemporalFixtures::reference_instant()));
        let config = ApiConfig {
            jwt_secret: SECRET.to_string(),
            ..ApiConfig::default()
        };
        let dyn_store: Arc<dyn WarrantyStore> = store.clone();
        let state = AppState::new(dyn_store, clock, config).unwrap();
        let server = TestServer::new(create_router(state)).unwrap();
        Self { server, store }
    }

    fn token(actor: &Actor) -> String {
        create_token(actor, SECRET, 3600).unwrap()
    }

    async fn fleet(&self, vehicles: usize) -> FleetScenario {
        FleetScenario::seed(self.store.as_ref(), "Battery pack", vehicles)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let api = Api::start();

    let response = api.server.get("/health").await;
    response.assert_status_ok();

    let ready = api.server.get("/health/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["status"], "ready");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let api = Api::start();

    let response = api.server.get("/api/v1/warranty-claims").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");

    let forged = api
        .server
        .get("/api/v1/warranty-claims")
        .authorization_bearer("not-a-token")
        .await;
    forged.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_recall_flow_over_http() {
    let api = Api::start();
    let fleet = api.fleet(2).await;
    let evm = Api::token(&ActorFixtures::evm_staff());
    let admin = Api::token(&ActorFixtures::admin());

    let created = api
        .server
        .post("/api/v1/recall-requests")
        .authorization_bearer(&evm)
        .json(&json!({ "partId": fleet.part.id.as_uuid(), "reason": "Thermal runaway risk" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let campaign_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let approved = api
        .server
        .post(&format!("/api/v1/recall-requests/{}/approve", campaign_id))
        .authorization_bearer(&admin)
        .await;
    approved.assert_status_ok();
    let body = approved.json::<Value>();
    assert_eq!(body["responsesCreated"], 2);
    assert_eq!(body["campaign"]["status"], "WAITING_CUSTOMER_CONFIRM");

    let again = api
        .server
        .post(&format!("/api/v1/recall-requests/{}/approve", campaign_id))
        .authorization_bearer(&admin)
        .await;
    again.assert_status(StatusCode::CONFLICT);

    let owner = Api::token(&fleet.member(0).owner);
    let mine = api
        .server
        .get("/api/v1/recall-responses/mine")
        .authorization_bearer(&owner)
        .await;
    mine.assert_status_ok();
    let mine = mine.json::<Value>();
    assert_eq!(mine["totalElements"], 1);
    let response_id = mine["content"][0]["id"].as_str().unwrap().to_string();

    let stranger = Api::token(&fleet.member(1).owner);
    api.server
        .patch(&format!("/api/v1/recall-responses/{}/confirm", response_id))
        .authorization_bearer(&stranger)
        .json(&json!({ "accepted": true }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let confirmed = api
        .server
        .patch(&format!("/api/v1/recall-responses/{}/confirm", response_id))
        .authorization_bearer(&owner)
        .json(&json!({ "accepted": true, "note": "Morning slot" }))
        .await;
    confirmed.assert_status_ok();
    let confirmed = confirmed.json::<Value>();
    assert_eq!(confirmed["status"], "IN_PROGRESS");
    assert!(confirmed["warrantyClaimId"].is_string());

    api.server
        .patch(&format!("/api/v1/recall-responses/{}/confirm", response_id))
        .authorization_bearer(&owner)
        .json(&json!({ "accepted": false }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let campaign = api
        .server
        .get(&format!("/api/v1/recall-requests/{}", campaign_id))
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(campaign["status"], "CLAIM_CREATED");
}

#[tokio::test]
async fn test_invalid_transition_lists_allowed_statuses() {
    let api = Api::start();
    let fleet = api.fleet(1).await;
    let staff = Api::token(&ActorFixtures::sc_staff());
    let member = fleet.member(0);

    let created = api
        .server
        .post("/api/v1/warranty-claims")
        .authorization_bearer(&staff)
        .json(&json!({
            "vehicleId": member.vehicle.id.as_uuid(),
            "installedPartId": member.installed.id.as_uuid(),
            "description": "Battery does not hold charge",
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let claim = created.json::<Value>();
    assert_eq!(claim["status"], "SUBMITTED");
    let claim_id = claim["id"].as_str().unwrap().to_string();

    let skipped = api
        .server
        .patch(&format!("/api/v1/warranty-claims/{}/status", claim_id))
        .authorization_bearer(&staff)
        .json(&json!({ "status": "COMPLETED" }))
        .await;
    skipped.assert_status(StatusCode::BAD_REQUEST);
    let body = skipped.json::<Value>();
    assert_eq!(body["error"], "invalid_transition");
    assert_eq!(body["details"], json!(["MANAGER_REVIEW", "REJECTED"]));

    let reviewed = api
        .server
        .patch(&format!("/api/v1/warranty-claims/{}/status", claim_id))
        .authorization_bearer(&staff)
        .json(&json!({ "status": "sc_review" }))
        .await;
    reviewed.assert_status_ok();
    assert_eq!(reviewed.json::<Value>()["status"], "MANAGER_REVIEW");

    let allowed = api
        .server
        .get(&format!("/api/v1/warranty-claims/{}/allowed-statuses", claim_id))
        .authorization_bearer(&staff)
        .await
        .json::<Value>();
    assert_eq!(allowed["allowed"], json!(["PROCESSING", "REJECTED"]));
}

#[tokio::test]
async fn test_request_validation_errors() {
    let api = Api::start();
    let fleet = api.fleet(1).await;
    let staff = Api::token(&ActorFixtures::sc_staff());
    let member = fleet.member(0);

    let blank = api
        .server
        .post("/api/v1/warranty-claims")
        .authorization_bearer(&staff)
        .json(&json!({
            "vehicleId": member.vehicle.id.as_uuid(),
            "installedPartId": member.installed.id.as_uuid(),
            "description": "",
        }))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(blank.json::<Value>()["error"], "validation_error");

    api.server
        .get("/api/v1/warranty-claims")
        .add_query_param("status", "LOST")
        .authorization_bearer(&staff)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    api.server
        .get("/api/v1/warranty-claims")
        .add_query_param("sortBy", "vin")
        .authorization_bearer(&staff)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_coverage_check_for_expired_part() {
    let api = Api::start();
    let vehicle = VehicleBuilder::new()
        .warranty_until(TemporalFixtures::expired_days_ago(30))
        .build();
    api.store.save_vehicle(&vehicle).await.unwrap();
    let part = test_utils::PartBuilder::new().build();
    api.store.save_part(&part).await.unwrap();
    let installed = test_utils::InstalledPartBuilder::new(&vehicle, &part).build();
    api.store.save_installed_part(&installed).await.unwrap();
    let staff = Api::token(&ActorFixtures::sc_staff());

    let response = api
        .server
        .get(&format!("/api/v1/installed-parts/{}/coverage", installed.id.as_uuid()))
        .add_query_param("estimatedRepairCost", "10000000")
        .authorization_bearer(&staff)
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["warrantyStatus"], "EXPIRED_DATE");
    assert_eq!(body["claimOption"], "PAID_ONLY");
    assert_eq!(body["daysExpired"], 30);
    assert!(body["estimatedFee"].is_string() || body["estimatedFee"].is_number());

    let customer = Api::token(&ActorFixtures::customer(vehicle.customer_id));
    api.server
        .get(&format!("/api/v1/installed-parts/{}/coverage", installed.id.as_uuid()))
        .authorization_bearer(&customer)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_part_request_lifecycle_over_http() {
    let api = Api::start();
    let fleet = api.fleet(1).await;
    let member = fleet.member(0);
    let staff = Api::token(&ActorFixtures::sc_staff());
    let technician = Api::token(&ActorFixtures::technician());
    let evm = Api::token(&ActorFixtures::evm_staff());

    let claim_id = api
        .server
        .post("/api/v1/warranty-claims")
        .authorization_bearer(&staff)
        .json(&json!({
            "vehicleId": member.vehicle.id.as_uuid(),
            "installedPartId": member.installed.id.as_uuid(),
            "description": "Cell imbalance",
        }))
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let zero = api
        .server
        .post("/api/v1/part-requests")
        .authorization_bearer(&technician)
        .json(&json!({
            "warrantyClaimId": claim_id,
            "faultyPartId": fleet.part.id.as_uuid(),
            "quantity": 0,
            "issueDescription": "Module 3 swollen",
        }))
        .await;
    zero.assert_status(StatusCode::BAD_REQUEST);

    let created = api
        .server
        .post("/api/v1/part-requests")
        .authorization_bearer(&technician)
        .json(&json!({
            "warrantyClaimId": claim_id,
            "faultyPartId": fleet.part.id.as_uuid(),
            "quantity": 1,
            "issueDescription": "Module 3 swollen",
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let request_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    api.server
        .post(&format!("/api/v1/part-requests/{}/ship", request_id))
        .authorization_bearer(&evm)
        .json(&json!({ "trackingNumber": "VN123" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    api.server
        .post(&format!("/api/v1/part-requests/{}/approve", request_id))
        .authorization_bearer(&evm)
        .await
        .assert_status_ok();

    let shipped = api
        .server
        .post(&format!("/api/v1/part-requests/{}/ship", request_id))
        .authorization_bearer(&evm)
        .json(&json!({ "trackingNumber": "VN123" }))
        .await;
    shipped.assert_status_ok();
    assert_eq!(shipped.json::<Value>()["trackingNumber"], "VN123");

    let listed = api
        .server
        .get("/api/v1/part-requests")
        .add_query_param("status", "SHIPPED")
        .authorization_bearer(&staff)
        .await
        .json::<Value>();
    assert_eq!(listed["totalElements"], 1);
}

#[tokio::test]
async fn test_feedback_over_http() {
    let api = Api::start();
    let fleet = api.fleet(2).await;
    let owner = fleet.member(0);
    let completed = ClaimBuilder::new(&owner.installed)
        .in_status(WarrantyClaimStatus::Completed)
        .build();
    api.store.insert_claim(&completed).await.unwrap();
    let open = ClaimBuilder::new(&owner.installed).build();
    api.store.insert_claim(&open).await.unwrap();

    let customer = Api::token(&owner.owner);
    let stranger = Api::token(&fleet.member(1).owner);
    let admin = Api::token(&ActorFixtures::admin());

    api.server
        .post("/api/v1/feedbacks")
        .authorization_bearer(&customer)
        .json(&json!({ "warrantyClaimId": open.id.as_uuid(), "rating": 4 }))
        .await
        .assert_status(StatusCode::CONFLICT);

    api.server
        .post("/api/v1/feedbacks")
        .authorization_bearer(&customer)
        .json(&json!({ "warrantyClaimId": completed.id.as_uuid(), "rating": 7 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    api.server
        .post("/api/v1/feedbacks")
        .authorization_bearer(&stranger)
        .json(&json!({ "warrantyClaimId": completed.id.as_uuid(), "rating": 1 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let created = api
        .server
        .post("/api/v1/feedbacks")
        .authorization_bearer(&customer)
        .json(&json!({ "warrantyClaimId": completed.id.as_uuid(), "rating": 5, "comment": "Great" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let feedback_id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let by_claim = api
        .server
        .get(&format!("/api/v1/warranty-claims/{}/feedback", completed.id.as_uuid()))
        .authorization_bearer(&customer)
        .await;
    by_claim.assert_status_ok();
    assert_eq!(by_claim.json::<Value>()["id"], feedback_id.as_str());

    api.server
        .put(&format!("/api/v1/feedbacks/{}", feedback_id))
        .authorization_bearer(&stranger)
        .json(&json!({ "rating": 1 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    api.server
        .get("/api/v1/feedbacks/summary")
        .authorization_bearer(&customer)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let summary = api
        .server
        .get("/api/v1/feedbacks/summary")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(summary["totalFeedbacks"], 1);
    assert_eq!(summary["ratingCounts"][4]["count"], 1);

    let filtered = api
        .server
        .get("/api/v1/feedbacks")
        .add_query_param("minRating", "4")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(filtered["totalElements"], 1);

    api.server
        .delete(&format!("/api/v1/feedbacks/{}", feedback_id))
        .authorization_bearer(&customer)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_work_logs_over_http() {
    let api = Api::start();
    let fleet = api.fleet(1).await;
    let claim = ClaimBuilder::new(&fleet.member(0).installed)
        .in_status(WarrantyClaimStatus::Processing)
        .build();
    api.store.insert_claim(&claim).await.unwrap();
    let technician = Api::token(&ActorFixtures::technician());
    let staff = Api::token(&ActorFixtures::sc_staff());

    let backwards = api
        .server
        .post("/api/v1/work-logs")
        .authorization_bearer(&technician)
        .json(&json!({
            "warrantyClaimId": claim.id.as_uuid(),
            "startTime": "2025-03-01T08:00:00Z",
            "endTime": "2025-03-01T07:00:00Z",
        }))
        .await;
    backwards.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(backwards.json::<Value>()["error"], "validation_error");

    let created = api
        .server
        .post("/api/v1/work-logs")
        .authorization_bearer(&technician)
        .json(&json!({
            "warrantyClaimId": claim.id.as_uuid(),
            "startTime": "2025-03-01T08:00:00Z",
            "endTime": "2025-03-01T09:30:00Z",
            "description": "Replaced contactor",
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["durationMinutes"], 90);

    let for_claim = api
        .server
        .get(&format!("/api/v1/warranty-claims/{}/work-logs", claim.id.as_uuid()))
        .authorization_bearer(&staff)
        .await
        .json::<Value>();
    assert_eq!(for_claim["totalElements"], 1);

    api.server
        .get("/api/v1/work-logs")
        .authorization_bearer(&staff)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
