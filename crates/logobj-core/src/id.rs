//! Class identity for the object runtime
//!
//! Class ids are small integers drawn from `[1, MAX_CLASSES)`. Id 0 is
//! reserved as "no class" and never appears on the wire.

use std::fmt;

use crate::{ObjError, ObjResult};

/// Upper bound (exclusive) of the class id space
pub const MAX_CLASSES: usize = 100;

/// Class identifier - unique per registered class for the process lifetime
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u16);

impl ClassId {
    /// The object runtime's own class
    pub const OBJ: ClassId = ClassId::new_const(1);

    /// Build a class id at compile time. Panics (at const evaluation) when
    /// `raw` lies outside `[1, MAX_CLASSES)`.
    pub const fn new_const(raw: u16) -> Self {
        assert!(raw >= 1 && (raw as usize) < MAX_CLASSES, "class id out of range");
        ClassId(raw)
    }

    /// Validate a wire or caller supplied id
    pub fn new(raw: i64) -> ObjResult<Self> {
        if raw < 1 || raw >= MAX_CLASSES as i64 {
            return Err(ObjError::InvalidClassId(raw));
        }
        Ok(ClassId(raw as u16))
    }

    /// Raw id as written in record headers
    #[inline]
    pub fn get(self) -> u16 {
        self.0
    }

    /// Slot in the registry table
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_id_bounds() {
        assert!(ClassId::new(1).is_ok());
        assert!(ClassId::new(MAX_CLASSES as i64 - 1).is_ok());

        assert!(matches!(ClassId::new(0), Err(ObjError::InvalidClassId(0))));
        assert!(matches!(ClassId::new(-3), Err(ObjError::InvalidClassId(-3))));
        assert!(matches!(
            ClassId::new(MAX_CLASSES as i64),
            Err(ObjError::InvalidClassId(_))
        ));
    }

    #[test]
    fn test_class_id_display() {
        let id = ClassId::new(42).unwrap();
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{:?}", id), "Class(42)");
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn test_obj_class_id() {
        assert_eq!(ClassId::OBJ.get(), 1);
    }
}
