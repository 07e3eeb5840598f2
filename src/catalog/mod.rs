//! Resource catalog
//!
//! Declarative descriptions of the resources the tap can extract. The
//! built-in catalog is embedded in the binary; a custom one can be loaded
//! from YAML.

mod loader;
mod types;

pub use loader::{Catalog, BUILTIN_CATALOG};
pub use types::{FilterMode, ResourceDescriptor};
