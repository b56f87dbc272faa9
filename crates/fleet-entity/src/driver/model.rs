//! Driver entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::clock;

/// A driver employed by a tenant. Drivers are soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Driver {
    /// Unique driver identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub company_id: String,
    /// Full legal name.
    pub full_name: String,
    /// Driving licence (SIM) number.
    pub license_number: String,
    /// Contact phone.
    pub phone: Option<String>,
    /// Vehicle currently assigned.
    pub vehicle_id: Option<Uuid>,
    /// Whether the driver can be dispatched.
    pub is_active: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Driver {
    /// Build a new active driver with a fresh id and timestamps.
    pub fn new(
        company_id: impl Into<String>,
        full_name: impl Into<String>,
        license_number: impl Into<String>,
    ) -> Self {
        let now = clock::now();
        Self {
            id: Uuid::now_v7(),
            company_id: company_id.into(),
            full_name: full_name.into(),
            license_number: license_number.into(),
            phone: None,
            vehicle_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
