//! Record deserializer with header resync
//!
//! A header that fails to parse is never fatal on its own: the reader scans
//! forward to the next `"\n<"` boundary and tries again, until a header
//! parses or the stream runs dry. Errors past the header (property lines,
//! trailer, class handlers) propagate immediately.

use logobj_core::{
    ClassDescriptor, ClassId, ClassRegistry, MethodSlot, ObjError, ObjResult, Object, Strm,
};

use crate::{
    read_header, read_property, read_trailer, PeekCursor, PropertyLine, RecordHeader, RecordKind,
    COOKIE_OBJLINE,
};

/// Last-chance mutation hook run after the properties are applied and before
/// the construction finalizer
pub type Fixup<'f> = &'f mut dyn FnMut(&mut dyn Object) -> ObjResult<()>;

/// Counters kept by a [`Deserializer`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeserializeStats {
    /// Records read completely
    pub records: u64,
    /// Property lines applied
    pub properties: u64,
    /// Header failures that started a resync
    pub recoveries: u64,
    /// Bytes skipped while resyncing
    pub bytes_skipped: u64,
}

/// Reads records from one stream
pub struct Deserializer<'a> {
    cur: PeekCursor<'a>,
    registry: &'a ClassRegistry,
    stats: DeserializeStats,
}

impl<'a> Deserializer<'a> {
    pub fn new(strm: &'a mut dyn Strm, registry: &'a ClassRegistry) -> Self {
        Deserializer {
            cur: PeekCursor::new(strm),
            registry,
            stats: DeserializeStats::default(),
        }
    }

    pub fn stats(&self) -> DeserializeStats {
        self.stats
    }

    /// True once the stream has no more bytes
    pub fn is_exhausted(&mut self) -> ObjResult<bool> {
        match self.cur.peek() {
            Ok(_) => Ok(false),
            Err(ObjError::EndOfStream) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Read a full object record of class `expected` and construct it
    pub fn deserialize(
        &mut self,
        expected: ClassId,
        fixup: Option<Fixup<'_>>,
    ) -> ObjResult<Box<dyn Object>> {
        let header = self.read_header_recovering(RecordKind::Object)?;
        if header.class_id != expected {
            tracing::warn!(
                expected = %expected,
                found = %header.class_id,
                "record class does not match"
            );
            return Err(ObjError::InvalidClassId(i64::from(header.class_id.get())));
        }

        let registry = self.registry;
        let class = registry.get(expected)?;
        let mut obj = class.construct()?;

        match self.complete_object(class, obj.as_mut(), fixup) {
            Ok(()) => {
                self.stats.records += 1;
                Ok(obj)
            }
            Err(e) => {
                teardown(class, obj);
                Err(e)
            }
        }
    }

    fn complete_object(
        &mut self,
        class: &ClassDescriptor,
        obj: &mut dyn Object,
        fixup: Option<Fixup<'_>>,
    ) -> ObjResult<()> {
        self.read_properties(class, obj)?;
        if let Some(fixup) = fixup {
            fixup(obj)?;
        }
        if class.is_implemented(MethodSlot::ConstructionFinalizer) {
            class.construction_finalize(obj)?;
        }
        Ok(())
    }

    /// Apply a property bag record to an existing instance
    pub fn deserialize_prop_bag(&mut self, obj: &mut dyn Object) -> ObjResult<()> {
        self.apply_record(obj, RecordKind::PropertyBag)
    }

    /// Apply a full object record to an existing instance, without
    /// constructing anything
    pub fn deserialize_obj_as_prop_bag(&mut self, obj: &mut dyn Object) -> ObjResult<()> {
        self.apply_record(obj, RecordKind::Object)
    }

    fn apply_record(&mut self, obj: &mut dyn Object, kind: RecordKind) -> ObjResult<()> {
        let header = self.read_header_recovering(kind)?;
        if header.class_id != obj.class_id() {
            tracing::warn!(
                expected = %obj.class_id(),
                found = %header.class_id,
                "property bag class does not match instance"
            );
            return Err(ObjError::InvalidClassId(i64::from(header.class_id.get())));
        }

        let registry = self.registry;
        let class = registry.get(header.class_id)?;
        self.read_properties(class, obj)?;
        self.stats.records += 1;
        Ok(())
    }

    /// Feed every property line into the class's `SetProperty` slot, then
    /// require the trailer
    pub fn read_properties(&mut self, class: &ClassDescriptor, obj: &mut dyn Object) -> ObjResult<()> {
        while let PropertyLine::Property(prop) = read_property(&mut self.cur)? {
            self.stats.properties += 1;
            class.set_property(obj, &prop)?;
        }
        read_trailer(&mut self.cur)
    }

    fn read_header_recovering(&mut self, kind: RecordKind) -> ObjResult<RecordHeader> {
        loop {
            match read_header(&mut self.cur, kind) {
                Ok(header) => return Ok(header),
                Err(e) if !e.is_header_recoverable() => return Err(e),
                Err(e) => {
                    tracing::warn!("invalid record header, resyncing: {}", e);
                    self.stats.recoveries += 1;
                    self.try_recover()?;
                }
            }
        }
    }

    /// Skip to just past the next newline that is followed by a header
    /// cookie, leaving the cookie unread
    fn try_recover(&mut self) -> ObjResult<()> {
        let start = self.cur.consumed();
        // The byte that broke the header may itself end a line
        let mut after_newline = self.cur.last() == Some(b'\n');

        let found = loop {
            let c = match self.cur.next_char() {
                Ok(c) => c,
                Err(e) => break Err(e),
            };
            if after_newline && c == COOKIE_OBJLINE {
                break self.cur.unread(c);
            }
            after_newline = c == b'\n';
        };

        let skipped = self.cur.consumed() - start;
        self.stats.bytes_skipped += skipped;
        match &found {
            Ok(()) => tracing::debug!(skipped, "resynced at record boundary"),
            Err(e) => tracing::warn!(skipped, "resync gave up: {}", e),
        }
        found
    }
}

fn teardown(class: &ClassDescriptor, obj: Box<dyn Object>) {
    tracing::debug!(class = class.name(), "destroying partially constructed object");
    if let Err(e) = class.destruct(obj) {
        tracing::warn!(class = class.name(), "destructor failed: {}", e);
    }
}

/// Read one object record of class `expected` from `strm`
pub fn deserialize(
    strm: &mut dyn Strm,
    registry: &ClassRegistry,
    expected: ClassId,
    fixup: Option<Fixup<'_>>,
) -> ObjResult<Box<dyn Object>> {
    Deserializer::new(strm, registry).deserialize(expected, fixup)
}

/// Apply one property bag record from `strm` to `obj`
pub fn deserialize_prop_bag(
    strm: &mut dyn Strm,
    registry: &ClassRegistry,
    obj: &mut dyn Object,
) -> ObjResult<()> {
    Deserializer::new(strm, registry).deserialize_prop_bag(obj)
}

/// Apply one object record from `strm` to `obj`
pub fn deserialize_obj_as_prop_bag(
    strm: &mut dyn Strm,
    registry: &ClassRegistry,
    obj: &mut dyn Object,
) -> ObjResult<()> {
    Deserializer::new(strm, registry).deserialize_obj_as_prop_bag(obj)
}
