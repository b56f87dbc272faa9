//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use uuid::Uuid;

use fleet_core::traits::Repository;
use fleet_database::{DatabasePool, RepositoryRegistry, RepositorySettings};
use fleet_entity::{Invoice, InvoiceStatus, Payment, PaymentMethod, Vehicle};

/// A registry on a fresh in-process engine.
pub fn registry() -> RepositoryRegistry {
    RepositoryRegistry::with_settings(DatabasePool::memory(), RepositorySettings::default())
}

/// Same, with strict tenant mode on.
pub fn strict_registry() -> RepositoryRegistry {
    RepositoryRegistry::with_settings(
        DatabasePool::memory(),
        RepositorySettings {
            require_tenant_scope: true,
            ..RepositorySettings::default()
        },
    )
}

/// Invoice `n` of `company`, with a deterministic id so listing order is
/// predictable.
pub fn invoice(company: &str, n: u128) -> Invoice {
    let mut inv = Invoice::new(
        company,
        format!("INV-{n:03}"),
        format!("Customer {n}"),
        1_000 * n as i64,
        110 * n as i64,
    );
    inv.id = Uuid::from_u128(n);
    inv.status = InvoiceStatus::Issued;
    inv
}

pub fn payment(invoice: &Invoice, n: u128) -> Payment {
    let mut pay = Payment::new(
        invoice.company_id.clone(),
        invoice.id,
        format!("PAY-{n:03}"),
        PaymentMethod::BankTransfer,
        invoice.total_amount,
    );
    pay.id = Uuid::from_u128(10_000 + n);
    pay
}

pub fn vehicle(company: &str, n: u128) -> Vehicle {
    let mut v = Vehicle::new(company, format!("B {n:04} XY"), "Toyota", "Hiace", 2020);
    v.id = Uuid::from_u128(20_000 + n);
    v
}

/// Insert invoices `ns` for `company`.
pub async fn seed_invoices(
    registry: &RepositoryRegistry,
    company: &str,
    ns: impl IntoIterator<Item = u128>,
) {
    for n in ns {
        registry.invoices().create(&invoice(company, n)).await.unwrap();
    }
}

pub fn ids(invoices: &[Invoice]) -> Vec<u128> {
    invoices.iter().map(|i| i.id.as_u128()).collect()
}
