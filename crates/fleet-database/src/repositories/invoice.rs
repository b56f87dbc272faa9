//! Invoice table binding.

use sqlx::Postgres;
use sqlx::query_builder::Separated;
use uuid::Uuid;

use fleet_entity::{Invoice, clock};

use crate::entity::{Deletion, Entity};
use crate::repository::GenericRepository;

/// Repository for invoices.
pub type InvoiceRepository = GenericRepository<Invoice>;

impl Entity for Invoice {
    const NAME: &'static str = "invoice";
    const TABLE: &'static str = "invoices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "company_id",
        "invoice_number",
        "customer_name",
        "status",
        "subtotal",
        "tax_amount",
        "total_amount",
        "issued_at",
        "due_at",
        "notes",
        "created_at",
        "updated_at",
        "deleted_at",
    ];
    const TEXT_COLUMNS: &'static [&'static str] = &[
        "company_id",
        "invoice_number",
        "customer_name",
        "status",
        "notes",
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
            .push_bind(self.invoice_number.clone())
            .push_bind(self.customer_name.clone())
            .push_bind(self.status.as_str())
            .push_bind(self.subtotal)
            .push_bind(self.tax_amount)
            .push_bind(self.total_amount)
            .push_bind(clock::stored(self.issued_at))
            .push_bind(clock::stored_opt(self.due_at))
            .push_bind(self.notes.clone())
            .push_bind(clock::stored(self.created_at))
            .push_bind(clock::stored(self.updated_at))
            .push_bind(clock::stored_opt(self.deleted_at));
    }
}
