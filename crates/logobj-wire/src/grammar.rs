//! Record grammar constants

/// First byte of a header line
pub const COOKIE_OBJLINE: u8 = b'<';
/// First byte of a property line
pub const COOKIE_PROPLINE: u8 = b'+';
/// First byte of the trailer line
pub const COOKIE_ENDLINE: u8 = b'>';
/// The blank line closing every record
pub const COOKIE_BLANKLINE: u8 = b'.';

/// Field separator
pub const DELIM: u8 = b':';

/// Serializer format version written into every header
pub const SERIALIZER_VERSION: u8 = b'1';

/// Trailer text following the end cookie
pub const TRAILER_TEXT: &[u8] = b"End\n";

/// Record kind, written as a 3 byte tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Complete object, constructible on read
    Object,
    /// Subset of properties, applied to an existing instance
    PropertyBag,
}

impl RecordKind {
    #[inline]
    pub fn tag(self) -> &'static [u8; 3] {
        match self {
            RecordKind::Object => b"Obj",
            RecordKind::PropertyBag => b"OPB",
        }
    }

    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"Obj" => Some(RecordKind::Object),
            b"OPB" => Some(RecordKind::PropertyBag),
            _ => None,
        }
    }
}

/// Parsed header fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: RecordKind,
    pub class_id: logobj_core::ClassId,
    pub version: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(RecordKind::Object.tag(), b"Obj");
        assert_eq!(RecordKind::PropertyBag.tag(), b"OPB");
        assert_eq!(RecordKind::from_tag(b"Obj"), Some(RecordKind::Object));
        assert_eq!(RecordKind::from_tag(b"OPB"), Some(RecordKind::PropertyBag));
        assert_eq!(RecordKind::from_tag(b"obj"), None);
    }
}
