//! Payment entity and derived payment instructions.

pub mod instruction;
pub mod model;

pub use instruction::PaymentInstruction;
pub use model::{Payment, PaymentMethod, PaymentStatus};
