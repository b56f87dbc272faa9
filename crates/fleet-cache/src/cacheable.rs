//! Secondary cache keys an entity is reachable under.

use fleet_database::Entity;
use fleet_entity::{Driver, Invoice, Payment, Vehicle};

use crate::keys;

/// An entity the cache-aside accessor can front.
///
/// Besides its id, an entity may be cached under a natural business key
/// (scoped by tenant) and may own derived entries that must be dropped
/// whenever the entity changes.
pub trait Cacheable: Entity {
    /// Column holding the natural key, e.g. `invoice_number`.
    const NATURAL_KEY: Option<&'static str> = None;

    /// This row's natural key value.
    fn natural_key(&self) -> Option<&str> {
        None
    }

    /// Derived cache keys invalidated together with this entity.
    fn derived_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Cacheable for Invoice {
    const NATURAL_KEY: Option<&'static str> = Some("invoice_number");

    fn natural_key(&self) -> Option<&str> {
        Some(&self.invoice_number)
    }
}

impl Cacheable for Payment {
    const NATURAL_KEY: Option<&'static str> = Some("payment_number");

    fn natural_key(&self) -> Option<&str> {
        Some(&self.payment_number)
    }

    fn derived_keys(&self) -> Vec<String> {
        vec![keys::payment_instructions(self.id)]
    }
}

impl Cacheable for Vehicle {
    const NATURAL_KEY: Option<&'static str> = Some("plate_number");

    fn natural_key(&self) -> Option<&str> {
        Some(&self.plate_number)
    }
}

impl Cacheable for Driver {
    const NATURAL_KEY: Option<&'static str> = Some("license_number");

    fn natural_key(&self) -> Option<&str> {
        Some(&self.license_number)
    }
}

/// The natural-key cache entry for `entity`, if it has one.
pub fn natural_key_entry<T: Cacheable>(entity: &T) -> Option<String> {
    let column = T::NATURAL_KEY?;
    let value = entity.natural_key()?;
    Some(keys::entity_by_natural_key(
        T::NAME,
        column,
        entity.tenant_id(),
        value,
    ))
}
