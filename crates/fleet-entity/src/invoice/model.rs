//! Invoice entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::clock;
use crate::status::text_enum;

text_enum! {
    /// Lifecycle state of an invoice.
    InvoiceStatus {
        /// Being prepared; not yet sent.
        Draft => "draft",
        /// Sent to the customer.
        Issued => "issued",
        /// Fully settled.
        Paid => "paid",
        /// Past due date without settlement.
        Overdue => "overdue",
        /// Voided.
        Cancelled => "cancelled",
    }
}

/// A customer invoice. Amounts are whole rupiah.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    /// Unique invoice identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub company_id: String,
    /// Human-facing invoice number, unique per tenant.
    pub invoice_number: String,
    /// Billed customer.
    pub customer_name: String,
    /// Lifecycle state.
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,
    /// Amount before tax.
    pub subtotal: i64,
    /// Tax amount.
    pub tax_amount: i64,
    /// `subtotal + tax_amount`.
    pub total_amount: i64,
    /// When the invoice was issued.
    pub issued_at: DateTime<Utc>,
    /// Payment due date.
    pub due_at: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Build a new draft invoice with a fresh id and timestamps.
    pub fn new(
        company_id: impl Into<String>,
        invoice_number: impl Into<String>,
        customer_name: impl Into<String>,
        subtotal: i64,
        tax_amount: i64,
    ) -> Self {
        let now = clock::now();
        Self {
            id: Uuid::now_v7(),
            company_id: company_id.into(),
            invoice_number: invoice_number.into(),
            customer_name: customer_name.into(),
            status: InvoiceStatus::Draft,
            subtotal,
            tax_amount,
            total_amount: subtotal + tax_amount,
            issued_at: now,
            due_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the invoice still expects payment.
    pub fn is_outstanding(&self) -> bool {
        matches!(self.status, InvoiceStatus::Issued | InvoiceStatus::Overdue)
    }
}
