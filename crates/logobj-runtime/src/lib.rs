//! logobj Runtime - Interface discovery and runtime context
//!
//! Everything outside the core reaches the object runtime through one
//! versioned entry point:
//! 1. Ask the module table for the `obj` interface at a version
//! 2. Receive a struct of bound operations ([`ObjIf`])
//! 3. Register classes, serialize and deserialize through it
//!
//! [`ObjRuntime`] bundles the frozen class registry, the module table and
//! the resolved interface for a process.

pub mod interface;
pub mod module;
pub mod config;
pub mod telemetry;
pub mod runtime;

pub use interface::*;
pub use module::*;
pub use config::*;
pub use telemetry::*;
pub use runtime::*;
