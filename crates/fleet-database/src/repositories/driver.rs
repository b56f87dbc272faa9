//! Driver table binding.

use sqlx::Postgres;
use sqlx::query_builder::Separated;
use uuid::Uuid;

use fleet_entity::{Driver, clock};

use crate::entity::{Deletion, Entity};
use crate::repository::GenericRepository;

pub type DriverRepository = GenericRepository<Driver>;

impl Entity for Driver {
    const NAME: &'static str = "driver";
    const TABLE: &'static str = "drivers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "company_id",
        "full_name",
        "license_number",
        "phone",
        "vehicle_id",
        "is_active",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &[
        "company_id",
        "full_name",
        "license_number",
        "phone",
    ];
    const DELETION: Deletion = Deletion::Soft {
        column: "deleted_at",
    };

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<&str> {
        Some(&self.company_id)
    }

    fn bind_row(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.id)
            .push_bind(self.company_id.clone())
            .push_bind(self.full_name.clone())
            .push_bind(self.license_number.clone())
            .push_bind(self.phone.clone())
            .push_bind(self.vehicle_id)
            .push_bind(self.is_active)
            .push_bind(clock::stored(self.created_at))
            .push_bind(clock::stored(self.updated_at))
            .push_bind(clock::stored_opt(self.deleted_at));
    }
}
