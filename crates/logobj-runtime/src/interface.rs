//! Interface query protocol
//!
//! Each class exposes one discovery function. Given a requested interface
//! version it hands back a struct of bound operations, or fails with
//! `InterfaceVersionMismatch`. Nothing else is ever resolved by name.

use std::fmt;

use logobj_core::{
    ClassDescriptor, ClassId, ClassRegistry, ConstructFn, DestructFn, Method, MethodSlot,
    ObjBase, ObjError, ObjResult, Object, PropValue, RegistryBuilder, Strm,
};
use logobj_wire::Fixup;

/// Interface version built by this crate
pub const OBJ_CURR_IF_VERSION: u32 = 2;
/// Oldest interface version still served
pub const OBJ_MIN_IF_VERSION: u32 = 1;

/// Module name of the object runtime's own interface
pub const OBJ_MODULE_NAME: &str = "obj";

/// Applies one record onto an existing instance
pub type ApplyRecordFn = fn(&mut dyn Strm, &ClassRegistry, &mut dyn Object) -> ObjResult<()>;

/// Discoverable interface of a class
pub trait QueryInterface: Sized + Send + Sync + 'static {
    /// Name the interface is resolved under
    const NAME: &'static str;
    const CURRENT_VERSION: u32;

    fn query_interface(requested: u32) -> ObjResult<Self>;
}

/// Bound operations of the object runtime
#[derive(Clone, Copy)]
pub struct ObjIf {
    /// Version this struct was filled for
    pub if_version: u32,
    pub class_id: ClassId,

    pub info_construct: fn(ClassId, &'static str, i32, ConstructFn, DestructFn) -> ClassDescriptor,
    pub info_set_method: fn(&mut ClassDescriptor, MethodSlot, Method) -> ObjResult<()>,
    pub destruct_obj_self: fn(&mut ObjBase),

    pub begin_serialize: fn(&mut dyn Strm, &dyn Object) -> ObjResult<()>,
    pub begin_serialize_prop_bag: fn(&mut dyn Strm, &dyn Object) -> ObjResult<()>,
    pub serialize_prop: fn(&mut dyn Strm, &str, Option<PropValue<'_>>) -> ObjResult<()>,
    pub end_serialize: fn(&mut dyn Strm) -> ObjResult<()>,

    pub register_obj: fn(&mut RegistryBuilder, ClassId, ClassDescriptor) -> ObjResult<()>,

    pub deserialize: fn(
        &mut dyn Strm,
        &ClassRegistry,
        ClassId,
        Option<Fixup<'_>>,
    ) -> ObjResult<Box<dyn Object>>,
    pub deserialize_prop_bag: ApplyRecordFn,
    /// Added in interface version 2
    pub deserialize_obj_as_prop_bag: Option<ApplyRecordFn>,

    pub set_name: fn(&mut ObjBase, &str) -> ObjResult<()>,
    pub get_name: fn(&mut ObjBase) -> &str,
}

impl fmt::Debug for ObjIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjIf")
            .field("if_version", &self.if_version)
            .field("class_id", &self.class_id)
            .field(
                "deserialize_obj_as_prop_bag",
                &self.deserialize_obj_as_prop_bag.is_some(),
            )
            .finish()
    }
}

/// Discovery function of the object runtime
pub fn obj_query_interface(requested: u32) -> ObjResult<ObjIf> {
    if !(OBJ_MIN_IF_VERSION..=OBJ_CURR_IF_VERSION).contains(&requested) {
        return Err(ObjError::InterfaceVersionMismatch {
            requested,
            min: OBJ_MIN_IF_VERSION,
            max: OBJ_CURR_IF_VERSION,
        });
    }

    let deserialize_obj_as_prop_bag: Option<ApplyRecordFn> = if requested >= 2 {
        Some(logobj_wire::deserialize_obj_as_prop_bag)
    } else {
        None
    };

    Ok(ObjIf {
        if_version: requested,
        class_id: ClassId::OBJ,
        info_construct: ClassDescriptor::define,
        info_set_method: ClassDescriptor::set_method,
        destruct_obj_self: ObjBase::destruct_self,
        begin_serialize: logobj_wire::begin_serialize,
        begin_serialize_prop_bag: logobj_wire::begin_serialize_prop_bag,
        serialize_prop: logobj_wire::serialize_prop,
        end_serialize: logobj_wire::end_serialize,
        register_obj: RegistryBuilder::register,
        deserialize: logobj_wire::deserialize,
        deserialize_prop_bag: logobj_wire::deserialize_prop_bag,
        deserialize_obj_as_prop_bag,
        set_name: ObjBase::set_name,
        get_name: ObjBase::get_name,
    })
}

/// Root of the dispatch graph: how any component bootstraps access to the
/// object runtime
pub fn obj_get_obj_interface(requested: u32) -> ObjResult<ObjIf> {
    let iface = obj_query_interface(requested);
    if let Err(e) = &iface {
        tracing::warn!(requested, "object interface unavailable: {}", e);
    }
    iface
}

impl QueryInterface for ObjIf {
    const NAME: &'static str = OBJ_MODULE_NAME;
    const CURRENT_VERSION: u32 = OBJ_CURR_IF_VERSION;

    fn query_interface(requested: u32) -> ObjResult<Self> {
        obj_query_interface(requested)
    }
}
