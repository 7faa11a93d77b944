//! Recall campaign workflow tests
//!
//! Covers approval fan-out, customer confirmation, and the cascade from a
//! completed recall claim back to its response.

mod common;

use common::World;
use core_kernel::{PageRequest, UserId};
use domain_warranty::{
    Actor, NewCampaign, RecallRequest, RecallRequestStatus, RecallResponse, RecallResponseStatus, Role,
    Vehicle, WarrantyClaimStatus, WarrantyError, WarrantyStore,
};

struct Recall {
    world: World,
    campaign: RecallRequest,
    owners: Vec<(Vehicle, Actor)>,
}

/// A pending "Battery fault" campaign on a part installed in three vehicles
async fn battery_recall() -> Recall {
    let world = World::new();
    let battery = world.part("Battery pack").await;
    let mut owners = Vec::new();
    for _ in 0..3 {
        let (vehicle, owner) = world.covered_vehicle().await;
        world.install(&vehicle, &battery).await;
        owners.push((vehicle, owner));
    }

    let campaign = world
        .campaigns
        .create_campaign(
            &world.evm,
            NewCampaign {
                part_id: battery.id,
                reason: "Battery fault".to_string(),
                customer_note: None,
            },
        )
        .await
        .unwrap();

    Recall { world, campaign, owners }
}

async fn response_for(world: &World, recall: &RecallRequest, vehicle: &Vehicle) -> RecallResponse {
    world
        .responses
        .responses_for_campaign(&world.admin, recall.id)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.vehicle_id == vehicle.id)
        .unwrap()
}

mod approval {
    use super::*;

    #[tokio::test]
    async fn test_approval_fans_out_one_response_per_vehicle() {
        let Recall { world, campaign, owners } = battery_recall().await;
        assert_eq!(campaign.status, RecallRequestStatus::PendingAdminApproval);

        let outcome = world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, Some("go".into()))
            .await
            .unwrap();

        assert_eq!(outcome.responses_created, 3);
        assert_eq!(outcome.campaign.status, RecallRequestStatus::WaitingCustomerConfirm);
        assert_eq!(outcome.campaign.approved_by, Some(world.admin.user_id));

        let responses = world
            .responses
            .responses_for_campaign(&world.admin, campaign.id)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().all(|r| r.status == RecallResponseStatus::Pending));
        for (vehicle, _) in &owners {
            assert_eq!(responses.iter().filter(|r| r.vehicle_id == vehicle.id).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_second_approval_is_conflict_without_duplicates() {
        let Recall { world, campaign, .. } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();

        let err = world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap_err();

        assert!(err.is_conflict(), "{err}");
        assert_eq!(world.store.response_count(campaign.id).await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_approvals_fan_out_once() {
        let Recall { world, campaign, .. } = battery_recall().await;

        let (first, second) = tokio::join!(
            world.campaigns.approve_campaign(&world.admin, campaign.id, None),
            world.campaigns.approve_campaign(&world.admin, campaign.id, None),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(WarrantyError::is_conflict));
        assert_eq!(world.store.response_count(campaign.id).await, 3);
    }

    #[tokio::test]
    async fn test_campaign_without_affected_vehicles_stays_approved() {
        let world = World::new();
        let part = world.part("Seat sensor").await;
        let campaign = world
            .campaigns
            .create_campaign(
                &world.evm,
                NewCampaign {
                    part_id: part.id,
                    reason: "Sensor drift".into(),
                    customer_note: None,
                },
            )
            .await
            .unwrap();

        let outcome = world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();

        assert_eq!(outcome.responses_created, 0);
        assert_eq!(outcome.campaign.status, RecallRequestStatus::ApprovedByAdmin);
    }

    #[tokio::test]
    async fn test_failed_fan_out_leaves_campaign_pending() {
        let Recall { world, campaign, .. } = battery_recall().await;
        world.store.fail_next_commit();

        let err = world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Store(_)));
        let stored = world.campaigns.get_campaign(campaign.id).await.unwrap();
        assert_eq!(stored.status, RecallRequestStatus::PendingAdminApproval);
        assert_eq!(world.store.response_count(campaign.id).await, 0);
    }

    #[tokio::test]
    async fn test_only_admins_approve() {
        let Recall { world, campaign, .. } = battery_recall().await;

        let err = world
            .campaigns
            .approve_campaign(&world.evm, campaign.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reject_requires_note_and_is_final() {
        let Recall { world, campaign, .. } = battery_recall().await;

        let err = world
            .campaigns
            .reject_campaign(&world.admin, campaign.id, "  ".into())
            .await
            .unwrap_err();
        assert!(matches!(err, WarrantyError::Validation(_)));

        let rejected = world
            .campaigns
            .reject_campaign(&world.admin, campaign.id, "supplier already fixed it".into())
            .await
            .unwrap();
        assert_eq!(rejected.status, RecallRequestStatus::RejectedByAdmin);

        let err = world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_only_creator_deletes_pending_campaign() {
        let Recall { world, campaign, .. } = battery_recall().await;
        let other_evm = Actor::new(UserId::new(), [Role::EvmStaff]);

        let err = world
            .campaigns
            .delete_campaign(&other_evm, campaign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, WarrantyError::Forbidden(_)));

        world.campaigns.delete_campaign(&world.evm, campaign.id).await.unwrap();
        let err = world.campaigns.get_campaign(campaign.id).await.unwrap_err();
        assert!(matches!(err, WarrantyError::NotFound { .. }));
    }
}

mod confirmation {
    use super::*;

    #[tokio::test]
    async fn test_battery_fault_scenario() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let (vehicle_a, owner_a) = &owners[0];
        let (vehicle_b, owner_b) = &owners[1];
        let (vehicle_c, _) = &owners[2];

        let response_a = response_for(&world, &campaign, vehicle_a).await;
        let accepted = world
            .responses
            .customer_confirm(owner_a, response_a.id, true, Some("will bring in next week".into()))
            .await
            .unwrap();

        assert_eq!(accepted.status, RecallResponseStatus::InProgress);
        assert_eq!(accepted.customer_note.as_deref(), Some("will bring in next week"));
        let claim_id = accepted.warranty_claim_id.unwrap();
        let claim = world.claims.get_claim(claim_id).await.unwrap();
        assert_eq!(claim.status, WarrantyClaimStatus::Submitted);
        assert_eq!(claim.vehicle_id, vehicle_a.id);
        assert_eq!(claim.recall_response_id, Some(response_a.id));
        assert!(claim.description.contains("Battery fault"));

        let response_b = response_for(&world, &campaign, vehicle_b).await;
        let declined = world
            .responses
            .customer_confirm(owner_b, response_b.id, false, None)
            .await
            .unwrap();
        assert_eq!(declined.status, RecallResponseStatus::Declined);
        assert_eq!(declined.warranty_claim_id, None);

        let response_c = response_for(&world, &campaign, vehicle_c).await;
        assert_eq!(response_c.status, RecallResponseStatus::Pending);

        assert_eq!(world.store.claim_count().await, 1);
        let stored = world.campaigns.get_campaign(campaign.id).await.unwrap();
        assert_eq!(stored.status, RecallRequestStatus::ClaimCreated);
    }

    #[tokio::test]
    async fn test_answering_twice_is_conflict_and_changes_nothing() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let (vehicle, owner) = &owners[0];
        let response = response_for(&world, &campaign, vehicle).await;
        world
            .responses
            .customer_confirm(owner, response.id, false, Some("sold the car".into()))
            .await
            .unwrap();
        let before = world.responses.get_response(owner, response.id).await.unwrap();

        let err = world
            .responses
            .customer_confirm(owner, response.id, true, None)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(world.responses.get_response(owner, response.id).await.unwrap(), before);
        assert_eq!(world.store.claim_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_acceptance_creates_nothing() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let (vehicle, owner) = &owners[0];
        let response = response_for(&world, &campaign, vehicle).await;
        world.store.fail_next_commit();

        let result = world.responses.customer_confirm(owner, response.id, true, None).await;

        assert!(result.is_err());
        assert_eq!(world.store.claim_count().await, 0);
        let stored = world.responses.get_response(owner, response.id).await.unwrap();
        assert_eq!(stored.status, RecallResponseStatus::Pending);
        assert_eq!(stored.warranty_claim_id, None);
        let campaign = world.campaigns.get_campaign(campaign.id).await.unwrap();
        assert_eq!(campaign.status, RecallRequestStatus::WaitingCustomerConfirm);
    }

    #[tokio::test]
    async fn test_other_customer_cannot_answer() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let (vehicle, _) = &owners[0];
        let (_, stranger) = &owners[1];
        let response = response_for(&world, &campaign, vehicle).await;

        let err = world
            .responses
            .customer_confirm(stranger, response.id, true, None)
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
        let err = world.responses.get_response(stranger, response.id).await.unwrap_err();
        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_staff_cannot_answer_for_customer() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let response = response_for(&world, &campaign, &owners[0].0).await;

        let err = world
            .responses
            .customer_confirm(&world.sc_staff, response.id, true, None)
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_customer_sees_own_responses_and_campaigns() {
        let Recall { world, campaign, owners } = battery_recall().await;
        world
            .campaigns
            .approve_campaign(&world.admin, campaign.id, None)
            .await
            .unwrap();
        let (vehicle, owner) = &owners[0];

        let page = world
            .responses
            .responses_for_customer(owner, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].vehicle_id, vehicle.id);

        let campaigns = world
            .campaigns
            .campaigns_for_customer(owner, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(campaigns.content.len(), 1);
        assert_eq!(campaigns.content[0].id, campaign.id);
    }
}

mod completion {
    use super::*;

    /// Approves the campaign and has the first owner accept; returns the response
    async fn accepted(recall: &Recall) -> RecallResponse {
        let world = &recall.world;
        world
            .campaigns
            .approve_campaign(&world.admin, recall.campaign.id, None)
            .await
            .unwrap();
        let (vehicle, owner) = &recall.owners[0];
        let response = response_for(world, &recall.campaign, vehicle).await;
        world
            .responses
            .customer_confirm(owner, response.id, true, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_completing_claim_completes_response() {
        let recall = battery_recall().await;
        let world = &recall.world;
        let response = accepted(&recall).await;
        let claim_id = response.warranty_claim_id.unwrap();

        world.claims.accept_claim(&world.evm, claim_id, None).await.unwrap();
        world
            .claims
            .start_processing(&world.technician, claim_id, None)
            .await
            .unwrap();
        let claim = world
            .claims
            .complete_claim(&world.technician, claim_id, Some("cells replaced".into()))
            .await
            .unwrap();

        assert_eq!(claim.status, WarrantyClaimStatus::Completed);
        assert!(claim.resolution_date.is_some());
        let response = world.store.get_response(response.id).await.unwrap();
        assert_eq!(response.status, RecallResponseStatus::Completed);
        assert!(response.completed_at.is_some());
        assert!(response.has_consistent_claim_link());
    }

    #[tokio::test]
    async fn test_complete_response_requires_completed_claim() {
        let recall = battery_recall().await;
        let world = &recall.world;
        let response = accepted(&recall).await;

        let err = world
            .responses
            .complete_response(&world.sc_staff, response.id)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        let stored = world.store.get_response(response.id).await.unwrap();
        assert_eq!(stored.status, RecallResponseStatus::InProgress);
    }

    #[tokio::test]
    async fn test_complete_response_rejects_pending() {
        let recall = battery_recall().await;
        let world = &recall.world;
        world
            .campaigns
            .approve_campaign(&world.admin, recall.campaign.id, None)
            .await
            .unwrap();
        let response = response_for(world, &recall.campaign, &recall.owners[0].0).await;

        let err = world
            .responses
            .complete_response(&world.sc_staff, response.id)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_failed_completion_leaves_claim_processing() {
        let recall = battery_recall().await;
        let world = &recall.world;
        let response = accepted(&recall).await;
        let claim_id = response.warranty_claim_id.unwrap();
        world.claims.accept_claim(&world.evm, claim_id, None).await.unwrap();
        world
            .claims
            .start_processing(&world.technician, claim_id, None)
            .await
            .unwrap();
        world.store.fail_next_commit();

        assert!(world
            .claims
            .complete_claim(&world.technician, claim_id, None)
            .await
            .is_err());

        let claim = world.claims.get_claim(claim_id).await.unwrap();
        assert_eq!(claim.status, WarrantyClaimStatus::Processing);
        let response = world.store.get_response(response.id).await.unwrap();
        assert_eq!(response.status, RecallResponseStatus::InProgress);
    }

    #[tokio::test]
    async fn test_recall_claim_cannot_be_deleted() {
        let recall = battery_recall().await;
        let world = &recall.world;
        let response = accepted(&recall).await;

        let err = world
            .claims
            .delete_claim(&world.admin, response.warranty_claim_id.unwrap())
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }
}
