//! Package scoring and ranking.
//!
//! A score combines three signals: recent downloads (base-10 logarithm), repository stars
//! (base-2 logarithm), and a bonus or penalty based on how long ago the last release happened.
//! Packages without any known release always score zero.

mod score;

pub use score::{rank, recency_bonus, score};
