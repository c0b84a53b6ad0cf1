//! Shared traits for ledger entities.

use uuid::Uuid;

/// Exposes a stable identifier for entities stored in the ledger.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Returns the position of the entity carrying `id`, if any.
pub fn position_of<T: Identifiable>(items: &[T], id: Uuid) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Finds an entity by case-insensitive, whitespace-trimmed name.
pub fn find_by_name<'a, T: NamedEntity>(items: &'a [T], name: &str) -> Option<&'a T> {
    let needle = name.trim().to_lowercase();
    items
        .iter()
        .find(|item| item.name().trim().to_lowercase() == needle)
}

// Re-export common dependencies so consumers can rely on this crate as a façade.
pub use chrono;
pub use rust_decimal;
pub use uuid;
