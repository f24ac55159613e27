//! Study tree common types, identifiers, and errors.
//!
//! This crate provides foundational types shared across the st-* crates:
//! - Study inventory identifiers (areas, outputs, simulation folders)
//! - Addresses into the study document and depth bounds
//! - The unified error type

pub mod address;
pub mod error;
pub mod id;

pub use address::{Address, Depth};
pub use error::{Error, Result};
pub use id::{AreaId, OutputId, OutputName, SimulationMode, StudyName};
