//! Vehicle table binding. Vehicles are hard-deleted.

use sqlx::Postgres;
use sqlx::query_builder::Separated;
use uuid::Uuid;

use fleet_entity::{Vehicle, clock};

use crate::entity::Entity;
use crate::repository::GenericRepository;

pub type VehicleRepository = GenericRepository<Vehicle>;

impl Entity for Vehicle {
    const NAME: &'static str = "vehicle";
    const TABLE: &'static str = "vehicles";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "company_id",
        "plate_number",
        "make",
        "model",
        "year",
        "status",
        "odometer_km",
        "created_at",
        "updated_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &[
        "company_id",
        "plate_number",
        "make",
        "model",
        "status",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<&str> {
        Some(&self.company_id)
    }

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.company_id.clone())
            .push_bind(self.plate_number.clone())
            .push_bind(self.make.clone())
            .push_bind(self.model.clone())
            .push_bind(self.year)
            .push_bind(self.status.as_str())
            .push_bind(self.odometer_km)
            .push_bind(clock::stored(self.created_at))
            .push_bind(clock::stored(self.updated_at));
    }
}
