#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for pypi-rank
//!
//! This library consolidates all functionality for the pypi-rank tool, which searches the
//! Python Package Index and ranks matching packages by popularity and release activity.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`facts`]: Data collection, caching, and enrichment
//! - [`scoring`]: Score computation and ranking
//! - [`reports`]: Table and JSON rendering

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod facts;

pub mod scoring;

#[cfg(any(debug_assertions, test))]
pub mod reports;
#[cfg(not(any(debug_assertions, test)))]
mod reports;

pub use crate::commands::{Host, run};
