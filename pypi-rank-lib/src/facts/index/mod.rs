//! The package index listing: every package name the index knows about.

mod provider;

pub use provider::Provider;
