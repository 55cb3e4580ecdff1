//! Record serializer
//!
//! Writing a record is three steps: a header opening a stream transaction,
//! one line per present property, and the trailer committing the
//! transaction. [`RecordWriter`] wraps the three and aborts the pending
//! record if it is dropped before `end`.

use logobj_core::{ClassRegistry, NumberFmt, ObjError, ObjResult, Object, PropValue, Strm};

use crate::{
    RecordKind, COOKIE_BLANKLINE, COOKIE_ENDLINE, COOKIE_OBJLINE, COOKIE_PROPLINE, DELIM,
    SERIALIZER_VERSION, TRAILER_TEXT,
};

fn begin_record(strm: &mut dyn Strm, obj: &dyn Object, kind: RecordKind) -> ObjResult<()> {
    let base = obj.base();

    strm.record_begin()?;
    strm.write_char(COOKIE_OBJLINE)?;
    strm.write(kind.tag())?;
    strm.write_char(DELIM)?;
    strm.write_char(SERIALIZER_VERSION)?;
    strm.write_char(DELIM)?;
    strm.write_long(i64::from(base.class_id().get()))?;
    strm.write_char(DELIM)?;
    strm.write_long(i64::from(base.version()))?;
    strm.write_char(DELIM)?;
    strm.write(base.class_name().as_bytes())?;
    strm.write_char(DELIM)?;
    strm.write_char(b'\n')
}

/// Open an object record for `obj`
pub fn begin_serialize(strm: &mut dyn Strm, obj: &dyn Object) -> ObjResult<()> {
    begin_record(strm, obj, RecordKind::Object)
}

/// Open a property bag record for `obj`
pub fn begin_serialize_prop_bag(strm: &mut dyn Strm, obj: &dyn Object) -> ObjResult<()> {
    begin_record(strm, obj, RecordKind::PropertyBag)
}

/// Write one property line. An absent value writes nothing.
pub fn serialize_prop(strm: &mut dyn Strm, name: &str, value: Option<PropValue<'_>>) -> ObjResult<()> {
    let Some(value) = value else {
        return Ok(());
    };

    if name.bytes().any(|b| b == DELIM || b == b'\n') {
        return Err(ObjError::InvalidPropertyName(name.to_string()));
    }

    let mut fmt = NumberFmt::new();
    let time;
    let encoded: &[u8] = match value {
        PropValue::Psz(s) => s.as_bytes(),
        PropValue::CStr(s) => s.as_bytes(),
        PropValue::Short(n) => fmt.format(i64::from(n)),
        PropValue::Int(n) => fmt.format(i64::from(n)),
        PropValue::Long(n) | PropValue::Int64(n) => fmt.format(n),
        PropValue::SyslogTime(t) => {
            time = t.render()?;
            time.as_bytes()
        }
    };

    strm.write_char(COOKIE_PROPLINE)?;
    strm.write(name.as_bytes())?;
    strm.write_char(DELIM)?;
    strm.write_long(value.prop_type().to_wire())?;
    strm.write_char(DELIM)?;
    strm.write_long(encoded.len() as i64)?;
    strm.write_char(DELIM)?;
    strm.write(encoded)?;
    strm.write_char(DELIM)?;
    strm.write_char(b'\n')
}

/// Write the trailer and commit the record
pub fn end_serialize(strm: &mut dyn Strm) -> ObjResult<()> {
    strm.write_char(COOKIE_ENDLINE)?;
    strm.write(TRAILER_TEXT)?;
    strm.write_char(COOKIE_BLANKLINE)?;
    strm.write_char(b'\n')?;
    strm.record_end()
}

/// Serialize `obj` through its class's `Serialize` slot
pub fn serialize_object(
    strm: &mut dyn Strm,
    registry: &ClassRegistry,
    obj: &dyn Object,
) -> ObjResult<()> {
    let class = registry.get(obj.class_id())?;
    let result = class.serialize(obj, strm);
    if let Err(e) = &result {
        tracing::debug!(class = class.name(), "serialize failed: {}", e);
        if let Err(abort) = strm.record_abort() {
            tracing::warn!("failed to abort record: {}", abort);
        }
    }
    result
}

/// Scoped record writer
pub struct RecordWriter<'s> {
    strm: &'s mut dyn Strm,
    finished: bool,
}

impl<'s> RecordWriter<'s> {
    /// Open an object record
    pub fn begin(strm: &'s mut dyn Strm, obj: &dyn Object) -> ObjResult<Self> {
        Self::open(strm, obj, RecordKind::Object)
    }

    /// Open a property bag record
    pub fn begin_prop_bag(strm: &'s mut dyn Strm, obj: &dyn Object) -> ObjResult<Self> {
        Self::open(strm, obj, RecordKind::PropertyBag)
    }

    fn open(strm: &'s mut dyn Strm, obj: &dyn Object, kind: RecordKind) -> ObjResult<Self> {
        let mut writer = RecordWriter {
            strm,
            finished: false,
        };
        begin_record(&mut *writer.strm, obj, kind)?;
        Ok(writer)
    }

    pub fn prop<'v>(&mut self, name: &str, value: impl Into<PropValue<'v>>) -> ObjResult<()> {
        serialize_prop(&mut *self.strm, name, Some(value.into()))
    }

    /// Property that may be unset
    pub fn prop_opt(&mut self, name: &str, value: Option<PropValue<'_>>) -> ObjResult<()> {
        serialize_prop(&mut *self.strm, name, value)
    }

    /// Write the trailer and commit
    pub fn end(mut self) -> ObjResult<()> {
        end_serialize(&mut *self.strm)?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for RecordWriter<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("aborting unfinished record");
            if let Err(e) = self.strm.record_abort() {
                tracing::warn!("failed to abort record: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStrm;
    use logobj_core::{impl_object, ClassDescriptor, ClassId, CountedStr, ObjBase, SyslogTime};

    #[derive(Debug)]
    struct Sample {
        base: ObjBase,
    }

    impl_object!(Sample);

    fn sample_class() -> ClassDescriptor {
        ClassDescriptor::define(ClassId::new_const(7), "sample", 3, construct, destruct)
    }

    fn construct() -> ObjResult<Box<dyn Object>> {
        Ok(Box::new(Sample {
            base: ObjBase::new(&sample_class()),
        }))
    }

    fn destruct(mut obj: Box<dyn Object>) -> ObjResult<()> {
        obj.base_mut().destruct_self();
        Ok(())
    }

    #[test]
    fn test_header_and_trailer() {
        let obj = construct().unwrap();
        let mut strm = MemStrm::new();
        begin_serialize(&mut strm, obj.as_ref()).unwrap();
        end_serialize(&mut strm).unwrap();
        assert_eq!(strm.as_bytes(), b"<Obj:1:7:3:sample:\n>End\n.\n");

        let mut strm = MemStrm::new();
        begin_serialize_prop_bag(&mut strm, obj.as_ref()).unwrap();
        assert_eq!(strm.as_bytes(), b"<OPB:1:7:3:sample:\n");
    }

    #[test]
    fn test_property_lines() {
        let mut strm = MemStrm::new();
        let cstr = CountedStr::from("a:b");
        let ts = SyslogTime {
            time_type: 2,
            year: 2008,
            month: 1,
            day: 7,
            hour: 13,
            minute: 45,
            second: 9,
            secfrac: 12,
            secfrac_precision: 2,
            offset_mode: b'+',
            offset_hour: 1,
            offset_minute: 0,
        };

        serialize_prop(&mut strm, "pszName", Some(PropValue::Psz("main"))).unwrap();
        serialize_prop(&mut strm, "cstr", Some(PropValue::CStr(&cstr))).unwrap();
        serialize_prop(&mut strm, "iNeg", Some(PropValue::Short(-42))).unwrap();
        serialize_prop(&mut strm, "iZero", Some(PropValue::Int(0))).unwrap();
        serialize_prop(&mut strm, "tm", Some(PropValue::SyslogTime(&ts))).unwrap();

        let expected = concat!(
            "+pszName:1:4:main:\n",
            "+cstr:1:3:a:b:\n",
            "+iNeg:2:3:-42:\n",
            "+iZero:2:1:0:\n",
            "+tm:3:29:2:2008:1:7:13:45:9:12:2:+:1:0:\n",
        );
        assert_eq!(std::str::from_utf8(strm.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn test_absent_value_writes_nothing() {
        let mut strm = MemStrm::new();
        serialize_prop(&mut strm, "unset", None).unwrap();
        assert!(strm.as_bytes().is_empty());
    }

    #[test]
    fn test_invalid_property_name() {
        let mut strm = MemStrm::new();
        for name in ["a:b", "line\nbreak"] {
            assert!(matches!(
                serialize_prop(&mut strm, name, Some(PropValue::Int(1))),
                Err(ObjError::InvalidPropertyName(_))
            ));
        }
        assert!(strm.as_bytes().is_empty());
    }

    #[test]
    fn test_time_overflow_reports_buffer_too_small() {
        let ts = SyslogTime {
            year: i32::MIN,
            month: i32::MIN,
            day: i32::MIN,
            hour: i32::MIN,
            minute: i32::MIN,
            second: i32::MIN,
            secfrac: i32::MIN,
            ..Default::default()
        };
        let mut strm = MemStrm::new();
        assert!(matches!(
            serialize_prop(&mut strm, "tm", Some(PropValue::SyslogTime(&ts))),
            Err(ObjError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_record_writer_aborts_on_drop() {
        let obj = construct().unwrap();
        let mut strm = MemStrm::new();
        {
            let mut writer = RecordWriter::begin(&mut strm, obj.as_ref()).unwrap();
            writer.prop("iNum", 5i32).unwrap();
            assert!(writer.prop("bad:name", 1i32).is_err());
        }
        assert!(strm.as_bytes().is_empty());

        let mut writer = RecordWriter::begin(&mut strm, obj.as_ref()).unwrap();
        writer.prop("iNum", 5i32).unwrap();
        writer.end().unwrap();
        assert_eq!(strm.as_bytes(), b"<Obj:1:7:3:sample:\n+iNum:2:1:5:\n>End\n.\n");
    }

    #[test]
    fn test_serialize_object_requires_slot() {
        let mut builder = logobj_core::RegistryBuilder::new().unwrap();
        builder.add(sample_class()).unwrap();
        let registry = builder.freeze();

        let obj = construct().unwrap();
        let mut strm = MemStrm::new();
        assert!(matches!(
            serialize_object(&mut strm, &registry, obj.as_ref()),
            Err(ObjError::NotImplemented(logobj_core::MethodSlot::Serialize))
        ));
    }
}
