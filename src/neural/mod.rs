//! Stem separation models
//!
//! This module provides:
//! - `StemSeparator` trait for every separation backend
//! - Demucs subprocess bridge
//! - Crossover mock for testing
//! - Model registry

mod demucs;
mod mock;
mod model;
mod registry;

pub use demucs::{DemucsSeparator, DEMUCS_MODELS};
pub use mock::MockSeparator;
pub use model::{Stem, StemSeparator, StemSet};
pub use registry::SeparatorRegistry;
