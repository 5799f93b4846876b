//! A curated list of the most downloaded packages, used for description search.

mod provider;

pub use provider::Provider;
