//! Class registry
//!
//! The registry is filled once during start-up through a [`RegistryBuilder`]
//! and then frozen. A frozen [`ClassRegistry`] never changes again, so it is
//! shared behind an `Arc` and read from any thread without locking.

use std::sync::Arc;

use crate::{ClassDescriptor, ClassId, ObjError, ObjResult, MAX_CLASSES};

/// Mutable registry used during the initialization phase
#[derive(Debug)]
pub struct RegistryBuilder {
    slots: Vec<Option<ClassDescriptor>>,
}

impl RegistryBuilder {
    pub fn new() -> ObjResult<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(MAX_CLASSES)
            .map_err(|_| ObjError::OutOfMemory)?;
        slots.resize_with(MAX_CLASSES, || None);
        Ok(RegistryBuilder { slots })
    }

    /// Register a class under `id`. Registering the same id twice is a
    /// programming error.
    pub fn register(&mut self, id: ClassId, class: ClassDescriptor) -> ObjResult<()> {
        // Range is guaranteed by `ClassId`; the slot must match the class
        if class.id() != id {
            return Err(ObjError::InvalidClassId(id.get() as i64));
        }
        let idx = id.index();
        debug_assert!(self.slots[idx].is_none(), "class {} registered twice", id);
        if self.slots[idx].is_some() {
            return Err(ObjError::ClassAlreadyRegistered(id));
        }

        tracing::debug!(class = class.name(), id = %id, version = class.version(), "registered class");
        self.slots[idx] = Some(class);
        Ok(())
    }

    /// Register a class under its own id
    pub fn add(&mut self, class: ClassDescriptor) -> ObjResult<()> {
        self.register(class.id(), class)
    }

    pub fn contains(&self, id: ClassId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// End the initialization phase
    pub fn freeze(self) -> Arc<ClassRegistry> {
        Arc::new(ClassRegistry { slots: self.slots })
    }
}

/// Frozen, read-only class registry
#[derive(Debug)]
pub struct ClassRegistry {
    slots: Vec<Option<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Descriptor registered under `id`, `ClassNotRegistered` otherwise
    pub fn get(&self, id: ClassId) -> ObjResult<&ClassDescriptor> {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.as_ref())
            .ok_or(ObjError::ClassNotRegistered(id))
    }

    pub fn contains(&self, id: ClassId) -> bool {
        self.get(id).is_ok()
    }

    /// Registered classes in id order
    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
