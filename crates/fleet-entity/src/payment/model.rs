//! Payment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::clock;
use crate::status::text_enum;

text_enum! {
    /// Settlement state of a payment.
    PaymentStatus {
        /// Awaiting funds.
        Pending => "pending",
        /// Funds received.
        Completed => "completed",
        /// Rejected or expired.
        Failed => "failed",
        /// Returned to the payer.
        Refunded => "refunded",
    }
}

text_enum! {
    /// Channel the payment arrives through.
    PaymentMethod {
        /// Manual bank transfer.
        BankTransfer => "bank_transfer",
        /// Bank-issued virtual account number.
        VirtualAccount => "virtual_account",
        /// Card payment.
        CreditCard => "credit_card",
        /// Cash at counter.
        Cash => "cash",
    }
}

/// A payment against an invoice. Amounts are whole rupiah.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique payment identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub company_id: String,
    /// Invoice being paid.
    pub invoice_id: Uuid,
    /// Human-facing payment number, unique per tenant.
    pub payment_number: String,
    /// Payment channel.
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    /// Settlement state.
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    /// Amount paid.
    pub amount: i64,
    /// When funds arrived.
    pub paid_at: Option<DateTime<Utc>>,
    /// External reference (bank reference, card auth code).
    pub reference: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Build a new pending payment with a fresh id and timestamps.
    pub fn new(
        company_id: impl Into<String>,
        invoice_id: Uuid,
        payment_number: impl Into<String>,
        method: PaymentMethod,
        amount: i64,
    ) -> Self {
        let now = clock::now();
        Self {
            id: Uuid::now_v7(),
            company_id: company_id.into(),
            invoice_id,
            payment_number: payment_number.into(),
            method,
            status: PaymentStatus::Pending,
            amount,
            paid_at: None,
            reference: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
