//! Part request service tests

mod common;

use common::World;
use core_kernel::{PageRequest, UserId};
use domain_warranty::{
    Actor, NewClaim, NewPartRequest, PartRequest, PartRequestFilter, PartRequestStatus, Role,
    WarrantyClaim, WarrantyError,
};

async fn open_claim(world: &World) -> WarrantyClaim {
    let part = world.part("Drive motor").await;
    let (vehicle, _) = world.covered_vehicle().await;
    let installed = world.install(&vehicle, &part).await;
    world
        .claims
        .submit_claim(
            &world.sc_staff,
            NewClaim {
                vehicle_id: vehicle.id,
                installed_part_id: installed.id,
                description: "Grinding noise".into(),
                is_paid_warranty: false,
                warranty_fee: None,
            },
        )
        .await
        .unwrap()
}

async fn requested(world: &World) -> PartRequest {
    let claim = open_claim(world).await;
    world
        .part_requests
        .create(
            &world.technician,
            NewPartRequest {
                warranty_claim_id: claim.id,
                faulty_part_id: claim_part(world, &claim).await,
                quantity: 1,
                issue_description: "Bearing worn out".into(),
                notes: Some("urgent".into()),
            },
        )
        .await
        .unwrap()
}

async fn claim_part(world: &World, claim: &WarrantyClaim) -> core_kernel::PartId {
    use domain_warranty::WarrantyStore;
    world
        .store
        .get_installed_part(claim.installed_part_id)
        .await
        .unwrap()
        .part_id
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn test_technician_creates_pending_request() {
        let world = World::new();

        let request = requested(&world).await;

        assert_eq!(request.status, PartRequestStatus::Pending);
        assert_eq!(request.requested_by, world.technician.user_id);
        assert_eq!(request.notes.as_deref(), Some("urgent"));
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let world = World::new();
        let claim = open_claim(&world).await;
        let part_id = claim_part(&world, &claim).await;

        let err = world
            .part_requests
            .create(
                &world.technician,
                NewPartRequest {
                    warranty_claim_id: claim.id,
                    faulty_part_id: part_id,
                    quantity: 0,
                    issue_description: "Bearing worn out".into(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_technicians_create() {
        let world = World::new();
        let claim = open_claim(&world).await;
        let part_id = claim_part(&world, &claim).await;

        let err = world
            .part_requests
            .create(
                &world.sc_staff,
                NewPartRequest {
                    warranty_claim_id: claim.id,
                    faulty_part_id: part_id,
                    quantity: 1,
                    issue_description: "Bearing worn out".into(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }
}

mod fulfilment {
    use super::*;

    #[tokio::test]
    async fn test_approve_ship_deliver() {
        let world = World::new();
        let request = requested(&world).await;

        let approved = world.part_requests.approve(&world.evm, request.id, None).await.unwrap();
        assert_eq!(approved.status, PartRequestStatus::Approved);
        assert_eq!(approved.approved_by, Some(world.evm.user_id));

        let shipped = world
            .part_requests
            .mark_shipped(&world.evm, request.id, "VN-TRK-0042".into())
            .await
            .unwrap();
        assert_eq!(shipped.tracking_number.as_deref(), Some("VN-TRK-0042"));

        let delivered = world
            .part_requests
            .mark_delivered(&world.sc_staff, request.id)
            .await
            .unwrap();
        assert_eq!(delivered.status, PartRequestStatus::Delivered);
        assert!(delivered.delivered_date.is_some());
        assert_eq!(delivered.version, 3);
    }

    #[tokio::test]
    async fn test_cannot_ship_before_approval() {
        let world = World::new();
        let request = requested(&world).await;

        let err = world
            .part_requests
            .mark_shipped(&world.evm, request.id, "VN-TRK-0042".into())
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(
            world.part_requests.get(request.id).await.unwrap().status,
            PartRequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let world = World::new();
        let request = requested(&world).await;

        let err = world
            .part_requests
            .reject(&world.evm, request.id, " ".into())
            .await
            .unwrap_err();
        assert!(matches!(err, WarrantyError::Validation(_)));

        let rejected = world
            .part_requests
            .reject(&world.evm, request.id, "out of stock".into())
            .await
            .unwrap();
        assert_eq!(rejected.status, PartRequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("out of stock"));
    }

    #[tokio::test]
    async fn test_service_center_cannot_approve() {
        let world = World::new();
        let request = requested(&world).await;

        let err = world
            .part_requests
            .approve(&world.sc_staff, request.id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }
}

mod withdrawal {
    use super::*;

    #[tokio::test]
    async fn test_owner_cancels_then_deletes() {
        let world = World::new();
        let request = requested(&world).await;

        let err = world.part_requests.delete(&world.technician, request.id).await.unwrap_err();
        assert!(err.is_conflict());

        let cancelled = world.part_requests.cancel(&world.technician, request.id).await.unwrap();
        assert_eq!(cancelled.status, PartRequestStatus::Cancelled);

        world.part_requests.delete(&world.technician, request.id).await.unwrap();
        let err = world.part_requests.get(request.id).await.unwrap_err();
        assert!(matches!(err, WarrantyError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_other_technician_cannot_cancel() {
        let world = World::new();
        let request = requested(&world).await;
        let colleague = Actor::new(UserId::new(), [Role::ScTechnician]);

        let err = world.part_requests.cancel(&colleague, request.id).await.unwrap_err();

        assert!(matches!(err, WarrantyError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_by_requester() {
        let world = World::new();
        let request = requested(&world).await;
        requested(&world).await;
        world.part_requests.cancel(&world.technician, request.id).await.unwrap();

        let page = world
            .part_requests
            .list(
                &PartRequestFilter {
                    status: Some(PartRequestStatus::Pending),
                    requested_by: Some(world.technician.user_id),
                    warranty_claim_id: None,
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].status, PartRequestStatus::Pending);
    }
}
