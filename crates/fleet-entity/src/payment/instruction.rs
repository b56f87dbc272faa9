//! Payment instructions shown to the payer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::PaymentMethod;

/// Where and how to pay. Derived from a payment, not persisted; cached for
/// an hour because it rarely changes while the payment is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstruction {
    /// Payment these instructions belong to.
    pub payment_id: Uuid,
    /// Payment channel.
    pub method: PaymentMethod,
    /// Receiving bank.
    pub bank_name: String,
    /// Account or virtual account number.
    pub account_number: String,
    /// Account holder name.
    pub account_holder: String,
    /// Amount to transfer.
    pub amount: i64,
    /// Instructions stop being valid after this instant.
    pub expires_at: Option<DateTime<Utc>>,
}
