//! logobj Core - Generic object runtime primitives
//!
//! This crate defines the pieces every object in the host rides on:
//! - Class identifiers and the bounded id space
//! - Object base fields (class back-reference, display name)
//! - Property values carried across the wire
//! - Capability tables with a "not implemented" sentinel
//! - The write-once class registry
//! - The byte stream boundary used by the serializer

pub mod id;
pub mod error;
pub mod value;
pub mod object;
pub mod class;
pub mod registry;
pub mod stream;

pub use id::*;
pub use error::*;
pub use value::*;
pub use object::*;
pub use class::*;
pub use registry::*;
pub use stream::*;
