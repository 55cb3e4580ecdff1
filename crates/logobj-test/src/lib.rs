//! logobj Test Harness - Sample classes and corruption testing
//!
//! This crate provides:
//! - Sample classes exercising every capability slot
//! - Garbage injection and header damage for disk queue images
//! - Recovery scenarios with statistics
//! - End-to-end and property-based tests

pub mod classes;
pub mod chaos;
pub mod integration;

pub use classes::*;
pub use chaos::*;
pub use integration::*;
