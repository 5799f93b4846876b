//! Per-package metadata from the PyPI JSON API.

mod provider;
mod registry_entry;

pub use provider::Provider;
pub use registry_entry::{PackageInfo, RegistryEntry, ReleaseUpload};
