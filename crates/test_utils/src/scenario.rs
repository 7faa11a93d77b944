//! Seeded fleet scenario
//!
//! Stores one part installed on a number of vehicles, each with its own
//! customer. Recall and claim tests start from here.

use core_kernel::PortError;
use domain_warranty::{Actor, InstalledPart, Part, Vehicle, WarrantyStore};

use crate::builders::{InstalledPartBuilder, PartBuilder, VehicleBuilder};
use crate::fixtures::ActorFixtures;

/// One vehicle of the scenario with its owner and installation
#[derive(Debug, Clone)]
pub struct FleetMember {
    pub vehicle: Vehicle,
    pub owner: Actor,
    pub installed: InstalledPart,
}

#[derive(Debug, Clone)]
pub struct FleetScenario {
    pub part: Part,
    pub members: Vec<FleetMember>,
}

impl FleetScenario {
    /// Seeds `vehicles` covered vehicles carrying a part named `part_name`
    pub async fn seed(
        store: &dyn WarrantyStore,
        part_name: &str,
        vehicles: usize,
    ) -> Result<Self, PortError> {
        let part = PartBuilder::new().named(part_name).build();
        store.save_part(&part).await?;

        let mut members = Vec::with_capacity(vehicles);
        for _ in 0..vehicles {
            let vehicle = VehicleBuilder::new().build();
            store.save_vehicle(&vehicle).await?;

            let installed = InstalledPartBuilder::new(&vehicle, &part).build();
            store.save_installed_part(&installed).await?;

            members.push(FleetMember {
                owner: ActorFixtures::customer(vehicle.customer_id),
                vehicle,
                installed,
            });
        }

        Ok(Self { part, members })
    }

    pub fn member(&self, index: usize) -> &FleetMember {
        &self.members[index]
    }
}
