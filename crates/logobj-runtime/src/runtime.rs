//! Runtime context
//!
//! Classes are registered on an [`ObjRuntimeBuilder`] during start-up;
//! `build` freezes the registry and resolves the object interface through
//! the module table. The resulting [`ObjRuntime`] is read-only.

use std::sync::Arc;

use logobj_core::{
    ClassDescriptor, ClassId, ClassRegistry, ObjResult, Object, RegistryBuilder, Strm,
};
use logobj_wire::Deserializer;

use crate::{ModuleTable, ObjConfig, ObjIf, QueryFn};

pub struct ObjRuntimeBuilder {
    config: ObjConfig,
    registry: RegistryBuilder,
    modules: ModuleTable,
}

impl ObjRuntimeBuilder {
    pub fn new(config: ObjConfig) -> ObjResult<Self> {
        config.validate()?;
        let modules = ModuleTable::new();
        modules.add_interface::<ObjIf>();

        Ok(ObjRuntimeBuilder {
            config,
            registry: RegistryBuilder::new()?,
            modules,
        })
    }

    /// Register a class under its own id
    pub fn define(&mut self, class: ClassDescriptor) -> ObjResult<&mut Self> {
        self.registry.add(class)?;
        Ok(self)
    }

    /// Register a class under `id`
    pub fn register(&mut self, id: ClassId, class: ClassDescriptor) -> ObjResult<&mut Self> {
        self.registry.register(id, class)?;
        Ok(self)
    }

    /// Make another module's discovery function resolvable
    pub fn module(&mut self, name: &str, query: QueryFn) -> &mut Self {
        self.modules.add_module(name, query);
        self
    }

    /// End the start-up phase
    pub fn build(self) -> ObjResult<ObjRuntime> {
        let iface = self
            .modules
            .use_interface_version::<ObjIf>(self.config.interface_version)?;
        let registry = self.registry.freeze();

        tracing::debug!(
            classes = registry.len(),
            interface_version = iface.if_version,
            "object runtime ready"
        );

        Ok(ObjRuntime {
            config: self.config,
            registry,
            modules: self.modules,
            iface,
        })
    }
}

#[derive(Debug)]
pub struct ObjRuntime {
    config: ObjConfig,
    registry: Arc<ClassRegistry>,
    modules: ModuleTable,
    iface: ObjIf,
}

impl ObjRuntime {
    pub fn builder(config: ObjConfig) -> ObjResult<ObjRuntimeBuilder> {
        ObjRuntimeBuilder::new(config)
    }

    /// Configuration the runtime was built with
    pub fn config(&self) -> &ObjConfig {
        &self.config
    }

    /// Object interface resolved at the configured version
    pub fn interface(&self) -> &ObjIf {
        &self.iface
    }

    /// Frozen class registry, shareable across threads
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Module table used to resolve interfaces
    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    /// Registered class descriptor for `id`
    pub fn class(&self, id: ClassId) -> ObjResult<&ClassDescriptor> {
        self.registry.get(id)
    }

    /// Reader for a stream of records
    pub fn deserializer<'a>(&'a self, strm: &'a mut dyn Strm) -> Deserializer<'a> {
        Deserializer::new(strm, &self.registry)
    }

    /// Write `obj` through its class's `Serialize` slot
    pub fn serialize(&self, strm: &mut dyn Strm, obj: &dyn Object) -> ObjResult<()> {
        logobj_wire::serialize_object(strm, &self.registry, obj)
    }

    /// Destroy `obj` through its class's destructor
    pub fn destroy(&self, obj: Box<dyn Object>) -> ObjResult<()> {
        self.registry.get(obj.class_id())?.destruct(obj)
    }
}
