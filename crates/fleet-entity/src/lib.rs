//! # fleet-entity
//!
//! Persisted record types. Every struct here is a table row and derives
//! `Debug`, `Clone`, `PartialEq`, `Serialize`, `Deserialize`, and
//! `sqlx::FromRow`. Status enums are stored as `TEXT` and share their
//! snake_case spelling between SQL and JSON.

pub mod clock;
pub mod driver;
pub mod invoice;
pub mod payment;
pub mod status;
pub mod vehicle;

pub use driver::Driver;
pub use invoice::{Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentInstruction, PaymentMethod, PaymentStatus};
pub use status::UnknownVariant;
pub use vehicle::{Vehicle, VehicleStatus};
