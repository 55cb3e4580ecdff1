//! Module table
//!
//! Stands in for the dynamic loader: maps a module name to its discovery
//! function. Modules may be added at any time, so the table sits behind a
//! lock; lookups clone the function pointer out and call it unlocked.

use std::any::Any;
use std::collections::HashMap;

use logobj_core::{ObjError, ObjResult};
use parking_lot::RwLock;

use crate::QueryInterface;

/// Type-erased discovery function
pub type QueryFn = fn(u32) -> ObjResult<Box<dyn Any + Send + Sync>>;

fn query_erased<I: QueryInterface>(requested: u32) -> ObjResult<Box<dyn Any + Send + Sync>> {
    let iface = I::query_interface(requested)?;
    Ok(Box::new(iface))
}

#[derive(Default)]
pub struct ModuleTable {
    modules: RwLock<HashMap<String, QueryFn>>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a module. Returns the discovery function it replaced.
    pub fn add_module(&self, name: &str, query: QueryFn) -> Option<QueryFn> {
        let previous = self.modules.write().insert(name.to_string(), query);
        if previous.is_some() {
            tracing::debug!(module = name, "replaced module");
        } else {
            tracing::debug!(module = name, "added module");
        }
        previous
    }

    /// Add the module serving interface `I`
    pub fn add_interface<I: QueryInterface>(&self) -> Option<QueryFn> {
        self.add_module(I::NAME, query_erased::<I>)
    }

    pub fn remove_module(&self, name: &str) -> bool {
        let removed = self.modules.write().remove(name).is_some();
        if removed {
            tracing::debug!(module = name, "removed module");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `I` at its current version
    pub fn use_interface<I: QueryInterface>(&self) -> ObjResult<I> {
        self.use_interface_version::<I>(I::CURRENT_VERSION)
    }

    /// Resolve `I` at `requested`
    pub fn use_interface_version<I: QueryInterface>(&self, requested: u32) -> ObjResult<I> {
        let query = self
            .modules
            .read()
            .get(I::NAME)
            .copied()
            .ok_or_else(|| ObjError::ModuleNotFound(I::NAME.to_string()))?;

        let iface = query(requested)?;
        match iface.downcast::<I>() {
            Ok(iface) => Ok(*iface),
            Err(_) => {
                tracing::warn!(module = I::NAME, requested, "module serves a different interface");
                Err(ObjError::InterfaceVersionMismatch {
                    requested,
                    min: I::CURRENT_VERSION,
                    max: I::CURRENT_VERSION,
                })
            }
        }
    }
}

impl std::fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let modules = self.modules.read();
        let mut names: Vec<&str> = modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModuleTable").field("modules", &names).finish()
    }
}
