//! Vehicle entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::clock;
use crate::status::text_enum;

text_enum! {
    /// Operational state of a vehicle.
    VehicleStatus {
        /// In service.
        Active => "active",
        /// Temporarily out of service.
        Maintenance => "maintenance",
        /// Permanently out of service.
        Retired => "retired",
    }
}

/// A fleet vehicle. Vehicles are hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    /// Unique vehicle identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub company_id: String,
    /// Registration plate.
    pub plate_number: String,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Operational state.
    #[sqlx(try_from = "String")]
    pub status: VehicleStatus,
    /// Odometer reading in kilometres.
    pub odometer_km: i64,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Build a new active vehicle with a fresh id and timestamps.
    pub fn new(
        company_id: impl Into<String>,
        plate_number: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
        year: i32,
    ) -> Self {
        let now = clock::now();
        Self {
            id: Uuid::now_v7(),
            company_id: company_id.into(),
            plate_number: plate_number.into(),
            make: make.into(),
            model: model.into(),
            year,
            status: VehicleStatus::Active,
            odometer_km: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
