//! Payment table binding.

use sqlx::Postgres;
use sqlx::query_builder::Separated;
use uuid::Uuid;

use fleet_entity::{Payment, clock};

use crate::entity::{Deletion, Entity};
use crate::repository::GenericRepository;

/// Repository for payments.
pub type PaymentRepository = GenericRepository<Payment>;

impl Entity for Payment {
    const NAME: &'static str = "payment";
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "company_id",
        "invoice_id",
        "payment_number",
        "method",
        "status",
        "amount",
        "paid_at",
        "reference",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &[
        "company_id",
        "payment_number",
        "method",
        "status",
        "reference",
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
            .push_bind(self.invoice_id)
            .push_bind(self.payment_number.clone())
            .push_bind(self.method.as_str())
            .push_bind(self.status.as_str())
            .push_bind(self.amount)
            .push_bind(clock::stored_opt(self.paid_at))
            .push_bind(self.reference.clone())
            .push_bind(clock::stored(self.created_at))
            .push_bind(clock::stored(self.updated_at))
            .push_bind(clock::stored_opt(self.deleted_at));
    }
}
