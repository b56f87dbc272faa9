//! Invoice entity.

pub mod model;

pub use model::{Invoice, InvoiceStatus};
