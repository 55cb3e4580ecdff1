//! Object base fields shared by every class instance

use std::any::Any;
use std::fmt;

use crate::{ClassDescriptor, ClassId, ObjError, ObjResult};

/// Base fields embedded in every concrete object
#[derive(Clone, Debug)]
pub struct ObjBase {
    class_id: ClassId,
    version: i32,
    class_name: &'static str,
    /// Instance display name, allocated lazily
    name: Option<String>,
}

impl ObjBase {
    /// Bind a new instance to its class
    pub fn new(class: &ClassDescriptor) -> Self {
        ObjBase {
            class_id: class.id(),
            version: class.version(),
            class_name: class.name(),
            name: None,
        }
    }

    #[inline]
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Class version written into record headers
    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    #[inline]
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Replace the display name
    pub fn set_name(&mut self, name: &str) -> ObjResult<()> {
        let mut owned = String::new();
        owned
            .try_reserve_exact(name.len())
            .map_err(|_| ObjError::OutOfMemory)?;
        owned.push_str(name);
        self.name = Some(owned);
        Ok(())
    }

    /// Display name, generated as `"<class> <address>"` on first use.
    /// Never fails: falls back to the class name.
    pub fn get_name(&mut self) -> &str {
        if self.name.is_none() {
            let generated = format!("{} {:p}", self.class_name, self as *const ObjBase);
            if self.set_name(&generated).is_err() {
                return self.class_name;
            }
        }
        self.name.as_deref().unwrap_or(self.class_name)
    }

    /// Name if one was set or generated already
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Tear down the base fields; every destructor calls this
    pub fn destruct_self(&mut self) {
        self.name = None;
    }
}

/// A class instance as seen by the runtime
pub trait Object: Any + Send + fmt::Debug {
    fn base(&self) -> &ObjBase;
    fn base_mut(&mut self) -> &mut ObjBase;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

// Every `Object` is `'static` through `Any`, so borrowed trait objects
// (`&mut dyn Object` inside handler signatures) get the helpers too.
impl<'a> dyn Object + 'a {
    #[inline]
    pub fn class_id(&self) -> ClassId {
        self.base().class_id()
    }

    /// Runtime type assertion against a class id
    pub fn is_class(&self, id: ClassId) -> bool {
        self.base().class_id() == id
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Object>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Take ownership of the concrete instance. On a type mismatch the
    /// object is handed back untouched.
    pub fn downcast<T: Object>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if !self.as_any().is::<T>() {
            return Err(self);
        }
        self.into_any().downcast::<T>().map_err(|_| {
            unreachable!("concrete type checked above")
        })
    }
}

/// Implements the boilerplate accessors of [`Object`] for a struct with an
/// `ObjBase` field named `base`
#[macro_export]
macro_rules! impl_object {
    ($ty:ty) => {
        impl $crate::Object for $ty {
            fn base(&self) -> &$crate::ObjBase {
                &self.base
            }
            fn base_mut(&mut self) -> &mut $crate::ObjBase {
                &mut self.base
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
            fn into_any(
                self: ::std::boxed::Box<Self>,
            ) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}
