//! Rendering of ranked search results
//!
//! Two formats are provided, each accessed through a `generate` function:
//! - **Console**: an aligned table with truncated long text and optional bold headers
//! - **JSON**: one JSON object per package per line
//!
//! Both take the records in their final order and write them unchanged; ranking and limiting
//! happen before rendering.

mod console;
mod json;

pub use console::generate as generate_console;
pub use json::generate as generate_json;
