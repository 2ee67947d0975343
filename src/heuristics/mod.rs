//! Heuristics module.
//!
//! This module exports the tour construction heuristics.

pub mod construction;

pub use construction::*;
