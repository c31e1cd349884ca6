//! Immutable species/move records and the catalog that serves them.

pub mod catalog;
pub mod moves;
pub mod species;
pub mod types;

pub use catalog::{builtin, Catalog, MemoryCatalog};

/// Lowercased alphanumeric form used as the lookup key for every record.
pub fn normalize_id(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
