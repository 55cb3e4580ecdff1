//! Class descriptors and capability tables
//!
//! Each class owns a fixed table of operation slots:
//! - Construct / Destruct: mandatory, installed when the class is defined
//! - Serialize, SetProperty, ConstructionFinalizer, GetSeverity, DebugPrint:
//!   optional, hold the `NotImplemented` sentinel until set
//!
//! Calling through an unset slot yields `ObjError::NotImplemented` instead of
//! requiring callers to check first.

use std::fmt;

use crate::{ClassId, ObjError, ObjResult, Object, Property, Strm};

/// Number of capability slots per class
pub const NUM_METHODS: usize = 7;

/// Allocate a fresh, empty instance
pub type ConstructFn = fn() -> ObjResult<Box<dyn Object>>;
/// Release an instance (must call `ObjBase::destruct_self`)
pub type DestructFn = fn(Box<dyn Object>) -> ObjResult<()>;
/// Write the instance's properties as a full record
pub type SerializeFn = fn(&dyn Object, &mut dyn Strm) -> ObjResult<()>;
/// Apply one deserialized property
pub type SetPropertyFn = fn(&mut dyn Object, &Property) -> ObjResult<()>;
/// Last step of construction after all properties are in place
pub type FinalizerFn = fn(&mut dyn Object) -> ObjResult<()>;
pub type GetSeverityFn = fn(&dyn Object) -> ObjResult<i32>;
pub type DebugPrintFn = fn(&dyn Object) -> ObjResult<()>;

/// Capability slot index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MethodSlot {
    Construct = 0,
    Destruct = 1,
    Serialize = 2,
    SetProperty = 3,
    ConstructionFinalizer = 4,
    GetSeverity = 5,
    DebugPrint = 6,
}

impl MethodSlot {
    pub const ALL: [MethodSlot; NUM_METHODS] = [
        MethodSlot::Construct,
        MethodSlot::Destruct,
        MethodSlot::Serialize,
        MethodSlot::SetProperty,
        MethodSlot::ConstructionFinalizer,
        MethodSlot::GetSeverity,
        MethodSlot::DebugPrint,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Handler stored in a capability slot
#[derive(Clone, Copy)]
pub enum Method {
    Construct(ConstructFn),
    Destruct(DestructFn),
    Serialize(SerializeFn),
    SetProperty(SetPropertyFn),
    ConstructionFinalizer(FinalizerFn),
    GetSeverity(GetSeverityFn),
    DebugPrint(DebugPrintFn),
    /// Shared sentinel for unset slots
    NotImplemented,
}

impl Method {
    /// Slot this handler's signature belongs to (`None` for the sentinel)
    pub fn slot(&self) -> Option<MethodSlot> {
        match self {
            Method::Construct(_) => Some(MethodSlot::Construct),
            Method::Destruct(_) => Some(MethodSlot::Destruct),
            Method::Serialize(_) => Some(MethodSlot::Serialize),
            Method::SetProperty(_) => Some(MethodSlot::SetProperty),
            Method::ConstructionFinalizer(_) => Some(MethodSlot::ConstructionFinalizer),
            Method::GetSeverity(_) => Some(MethodSlot::GetSeverity),
            Method::DebugPrint(_) => Some(MethodSlot::DebugPrint),
            Method::NotImplemented => None,
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Method::NotImplemented)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "Method({:?})", slot),
            None => write!(f, "Method(NotImplemented)"),
        }
    }
}

/// Per-class descriptor: identity plus capability table
#[derive(Clone)]
pub struct ClassDescriptor {
    id: ClassId,
    name: &'static str,
    version: i32,
    methods: [Method; NUM_METHODS],
}

impl ClassDescriptor {
    /// Define a class. Constructor and destructor are mandatory; every other
    /// slot starts out as the sentinel.
    pub fn define(
        id: ClassId,
        name: &'static str,
        version: i32,
        construct: ConstructFn,
        destruct: DestructFn,
    ) -> Self {
        let mut methods = [Method::NotImplemented; NUM_METHODS];
        methods[MethodSlot::Construct.index()] = Method::Construct(construct);
        methods[MethodSlot::Destruct.index()] = Method::Destruct(destruct);

        ClassDescriptor {
            id,
            name,
            version,
            methods,
        }
    }

    /// Install a handler. The handler kind must match `slot`; the sentinel
    /// may be installed into any slot. Slots 0 and 1 may be overwritten.
    pub fn set_method(&mut self, slot: MethodSlot, handler: Method) -> ObjResult<()> {
        match handler.slot() {
            Some(s) if s != slot => return Err(ObjError::MethodSlotMismatch { slot }),
            _ => {}
        }
        self.methods[slot.index()] = handler;
        Ok(())
    }

    /// Builder-style `set_method` for handlers whose slot is implied
    pub fn with_method(mut self, handler: Method) -> Self {
        if let Some(slot) = handler.slot() {
            self.methods[slot.index()] = handler;
        }
        self
    }

    #[inline]
    pub fn is_implemented(&self, slot: MethodSlot) -> bool {
        !self.methods[slot.index()].is_sentinel()
    }

    #[inline]
    pub fn method(&self, slot: MethodSlot) -> Method {
        self.methods[slot.index()]
    }

    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn construct(&self) -> ObjResult<Box<dyn Object>> {
        match self.method(MethodSlot::Construct) {
            Method::Construct(f) => f(),
            _ => Err(ObjError::NotImplemented(MethodSlot::Construct)),
        }
    }

    pub fn destruct(&self, obj: Box<dyn Object>) -> ObjResult<()> {
        match self.method(MethodSlot::Destruct) {
            Method::Destruct(f) => f(obj),
            _ => Err(ObjError::NotImplemented(MethodSlot::Destruct)),
        }
    }

    pub fn serialize(&self, obj: &dyn Object, strm: &mut dyn Strm) -> ObjResult<()> {
        match self.method(MethodSlot::Serialize) {
            Method::Serialize(f) => f(obj, strm),
            _ => Err(ObjError::NotImplemented(MethodSlot::Serialize)),
        }
    }

    pub fn set_property(&self, obj: &mut dyn Object, prop: &Property) -> ObjResult<()> {
        match self.method(MethodSlot::SetProperty) {
            Method::SetProperty(f) => f(obj, prop),
            _ => Err(ObjError::NotImplemented(MethodSlot::SetProperty)),
        }
    }

    pub fn construction_finalize(&self, obj: &mut dyn Object) -> ObjResult<()> {
        match self.method(MethodSlot::ConstructionFinalizer) {
            Method::ConstructionFinalizer(f) => f(obj),
            _ => Err(ObjError::NotImplemented(MethodSlot::ConstructionFinalizer)),
        }
    }

    pub fn get_severity(&self, obj: &dyn Object) -> ObjResult<i32> {
        match self.method(MethodSlot::GetSeverity) {
            Method::GetSeverity(f) => f(obj),
            _ => Err(ObjError::NotImplemented(MethodSlot::GetSeverity)),
        }
    }

    pub fn debug_print(&self, obj: &dyn Object) -> ObjResult<()> {
        match self.method(MethodSlot::DebugPrint) {
            Method::DebugPrint(f) => f(obj),
            _ => Err(ObjError::NotImplemented(MethodSlot::DebugPrint)),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let implemented: Vec<MethodSlot> = MethodSlot::ALL
            .iter()
            .copied()
            .filter(|s| self.is_implemented(*s))
            .collect();
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("implemented", &implemented)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{impl_object, ObjBase, Value};

    const PLAIN: ClassId = ClassId::new_const(12);

    #[derive(Debug)]
    struct Plain {
        base: ObjBase,
        level: i64,
    }

    impl_object!(Plain);

    fn plain_class() -> ClassDescriptor {
        ClassDescriptor::define(PLAIN, "plain", 1, construct, destruct)
    }

    fn construct() -> ObjResult<Box<dyn Object>> {
        Ok(Box::new(Plain {
            base: ObjBase::new(&plain_class()),
            level: 0,
        }))
    }

    fn destruct(mut obj: Box<dyn Object>) -> ObjResult<()> {
        obj.base_mut().destruct_self();
        Ok(())
    }

    fn set_property(obj: &mut dyn Object, prop: &Property) -> ObjResult<()> {
        let plain = obj.downcast_mut::<Plain>().ok_or(ObjError::InvalidClassId(0))?;
        if let Some(n) = prop.as_number() {
            plain.level = n;
        }
        Ok(())
    }

    fn severity(obj: &dyn Object) -> ObjResult<i32> {
        let plain = obj.downcast_ref::<Plain>().ok_or(ObjError::InvalidClassId(0))?;
        Ok(plain.level as i32)
    }

    #[test]
    fn test_define_installs_sentinels() {
        let class = plain_class();
        assert!(class.is_implemented(MethodSlot::Construct));
        assert!(class.is_implemented(MethodSlot::Destruct));
        for slot in &MethodSlot::ALL[2..] {
            assert!(!class.is_implemented(*slot), "{:?} should be unset", slot);
        }
    }

    #[test]
    fn test_unset_slots_report_not_implemented() {
        let class = plain_class();
        let mut obj = class.construct().unwrap();
        let prop = Property::new("x", Value::Number(1));

        assert!(matches!(
            class.set_property(obj.as_mut(), &prop),
            Err(ObjError::NotImplemented(MethodSlot::SetProperty))
        ));
        assert!(matches!(
            class.construction_finalize(obj.as_mut()),
            Err(ObjError::NotImplemented(MethodSlot::ConstructionFinalizer))
        ));
        assert!(matches!(
            class.get_severity(obj.as_ref()),
            Err(ObjError::NotImplemented(MethodSlot::GetSeverity))
        ));
        assert!(matches!(
            class.debug_print(obj.as_ref()),
            Err(ObjError::NotImplemented(MethodSlot::DebugPrint))
        ));
        class.destruct(obj).unwrap();
    }

    #[test]
    fn test_set_method() {
        let mut class = plain_class();
        class
            .set_method(MethodSlot::SetProperty, Method::SetProperty(set_property))
            .unwrap();
        class
            .set_method(MethodSlot::GetSeverity, Method::GetSeverity(severity))
            .unwrap();
        assert!(class.is_implemented(MethodSlot::SetProperty));

        let mut obj = class.construct().unwrap();
        class
            .set_property(obj.as_mut(), &Property::new("level", Value::Number(6)))
            .unwrap();
        assert_eq!(class.get_severity(obj.as_ref()).unwrap(), 6);

        // Resetting to the sentinel un-implements the slot
        class
            .set_method(MethodSlot::GetSeverity, Method::NotImplemented)
            .unwrap();
        assert!(!class.is_implemented(MethodSlot::GetSeverity));
    }

    #[test]
    fn test_set_method_slot_mismatch() {
        let mut class = plain_class();
        let result = class.set_method(MethodSlot::DebugPrint, Method::GetSeverity(severity));
        assert!(matches!(
            result,
            Err(ObjError::MethodSlotMismatch {
                slot: MethodSlot::DebugPrint
            })
        ));
        assert!(!class.is_implemented(MethodSlot::DebugPrint));
    }

    #[test]
    fn test_slot_index_roundtrip() {
        for (i, slot) in MethodSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
