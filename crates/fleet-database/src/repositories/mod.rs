//! [`Entity`](crate::entity::Entity) bindings for every fleet table.

pub mod driver;
pub mod invoice;
pub mod payment;
pub mod vehicle;

pub use driver::DriverRepository;
pub use invoice::InvoiceRepository;
pub use payment::PaymentRepository;
pub use vehicle::VehicleRepository;
