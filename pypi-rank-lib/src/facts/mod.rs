//! Data collection and enrichment for PyPI packages
//!
//! This module is responsible for finding packages that match a search query and gathering
//! popularity signals about each of them from several independent services:
//!
//! - **Index listing**: every package name known to PyPI
//! - **Registry entries**: summary, version, homepage, and release history from the PyPI JSON API
//! - **Download statistics**: per-day, per-version download counts from pepy.tech
//! - **Repository hosting**: GitHub star counts
//! - **Popular packages**: a curated list of high-traffic packages used for description search
//!
//! # Implementation Model
//!
//! Every adapter returns a [`ProviderResult`] which is `Found`, `NotFound`, or `Error`, so that a
//! failing source only leaves the corresponding [`PackageRecord`] fields unset. All adapters go
//! through a shared, directory-backed [`Cache`] that memoizes found and not-found answers
//! indefinitely until it is explicitly cleared.
//!
//! The [`Collector`] selects candidates with a [`SearchQuery`], then fans enrichment out over a
//! bounded [`TaskPool`], scores every record, and returns the ranked list.

mod cache;
mod cache_lock;
mod collector;
pub mod downloads;
mod enricher;
mod endpoints;
pub mod hosting;
mod http;
pub mod index;
mod package_record;
mod path_utils;
pub mod popular;
mod progress;
mod provider_result;
pub mod registry;
mod repo_spec;
mod selector;
mod task_pool;

pub use cache::{Cache, CacheKey, CacheResult};
pub use collector::{Collector, Settings};
pub use endpoints::Endpoints;
pub use enricher::Enricher;
pub use package_record::PackageRecord;
pub use progress::{NoOpProgress, Progress};
pub use provider_result::ProviderResult;
pub use repo_spec::RepoSpec;
pub use selector::{MAX_CANDIDATES, SearchQuery, union_candidates};
pub use task_pool::TaskPool;
