//! Grammar primitives for reading records
//!
//! Every primitive consumes exactly the bytes of its field including the
//! terminating delimiter. Header errors are recoverable by the caller
//! (resync); errors inside property lines and the trailer are not.

use logobj_core::{
    ClassId, CountedStr, ObjError, ObjResult, PropType, Property, SyslogTime, Value,
};

use crate::{
    PeekCursor, RecordHeader, RecordKind, COOKIE_BLANKLINE, COOKIE_ENDLINE, COOKIE_OBJLINE,
    COOKIE_PROPLINE, DELIM, SERIALIZER_VERSION,
};

/// Initial buffer reservation for string values; the declared length on the
/// wire is not trusted for allocation
const STR_PREALLOC_LIMIT: usize = 4096;

/// Outcome of reading at a property line position
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyLine {
    Property(Property),
    /// The next line is not a property line; nothing was consumed
    EndOfList,
}

/// Optional `-`, one or more digits, then `:`
pub fn read_number(cur: &mut PeekCursor<'_>) -> ObjResult<i64> {
    let mut c = cur.next_char()?;
    let negative = c == b'-';
    if negative {
        c = cur.next_char()?;
    }

    if !c.is_ascii_digit() {
        return Err(ObjError::InvalidNumber);
    }

    // Accumulate towards the sign so i64::MIN parses
    let mut n: i64 = 0;
    while c.is_ascii_digit() {
        let digit = (c - b'0') as i64;
        n = n
            .checked_mul(10)
            .and_then(|n| {
                if negative {
                    n.checked_sub(digit)
                } else {
                    n.checked_add(digit)
                }
            })
            .ok_or(ObjError::InvalidNumber)?;
        c = cur.next_char()?;
    }

    if c != DELIM {
        return Err(ObjError::InvalidDelimiter(c));
    }
    Ok(n)
}

/// Exactly `len` bytes, then `:`
pub fn read_fixed_str(cur: &mut PeekCursor<'_>, len: usize) -> ObjResult<CountedStr> {
    let mut buf = Vec::with_capacity(len.min(STR_PREALLOC_LIMIT));
    for _ in 0..len {
        buf.push(cur.next_char()?);
    }

    let c = cur.next_char()?;
    if c != DELIM {
        return Err(ObjError::InvalidDelimiter(c));
    }
    Ok(CountedStr::from(buf))
}

fn read_i32(cur: &mut PeekCursor<'_>) -> ObjResult<i32> {
    i32::try_from(read_number(cur)?).map_err(|_| ObjError::InvalidNumber)
}

/// Nine numbers, the offset sign byte plus `:`, two more numbers
pub fn read_syslog_time(cur: &mut PeekCursor<'_>) -> ObjResult<SyslogTime> {
    let time_type = u8::try_from(read_number(cur)?).map_err(|_| ObjError::InvalidNumber)?;
    let year = read_i32(cur)?;
    let month = read_i32(cur)?;
    let day = read_i32(cur)?;
    let hour = read_i32(cur)?;
    let minute = read_i32(cur)?;
    let second = read_i32(cur)?;
    let secfrac = read_i32(cur)?;
    let secfrac_precision = read_i32(cur)?;

    // Offset mode is a single raw byte
    let offset_mode = cur.next_char()?;
    let c = cur.next_char()?;
    if c != DELIM {
        return Err(ObjError::InvalidDelimiter(c));
    }

    let offset_hour = read_i32(cur)?;
    let offset_minute = read_i32(cur)?;

    Ok(SyslogTime {
        time_type,
        year,
        month,
        day,
        hour,
        minute,
        second,
        secfrac,
        secfrac_precision,
        offset_mode,
        offset_hour,
        offset_minute,
    })
}

/// Header line of the expected kind. The class name is skipped, not parsed.
pub fn read_header(cur: &mut PeekCursor<'_>, kind: RecordKind) -> ObjResult<RecordHeader> {
    cur.expect(COOKIE_OBJLINE, ObjError::InvalidHeaderCookie)?;
    for &b in kind.tag() {
        cur.expect(b, ObjError::InvalidHeaderKindTag)?;
    }
    cur.expect(DELIM, ObjError::InvalidHeaderCookie)?;
    cur.expect(SERIALIZER_VERSION, ObjError::InvalidHeaderFormatVersion)?;
    cur.expect(DELIM, ObjError::InvalidHeaderFormatVersion)?;

    let raw_id = read_number(cur)?;
    let version = read_number(cur)?;

    let class_id = ClassId::new(raw_id)?;
    let version = i32::try_from(version).map_err(|_| ObjError::InvalidNumber)?;

    while cur.next_char()? != b'\n' {}

    Ok(RecordHeader {
        kind,
        class_id,
        version,
    })
}

/// One property line, or `EndOfList` if the next line is something else
pub fn read_property(cur: &mut PeekCursor<'_>) -> ObjResult<PropertyLine> {
    if cur.peek()? != COOKIE_PROPLINE {
        return Ok(PropertyLine::EndOfList);
    }
    cur.next_char()?;

    let mut raw_name = Vec::new();
    loop {
        match cur.next_char()? {
            DELIM => break,
            b'\n' => return Err(ObjError::InvalidPropertyFrame("line break in property name")),
            c => raw_name.push(c),
        }
    }
    let name = String::from_utf8(raw_name)
        .map_err(|_| ObjError::InvalidPropertyFrame("property name is not UTF-8"))?;

    let tag = read_number(cur).map_err(|e| e.into_prop_frame("type tag"))?;
    let len = read_number(cur).map_err(|e| e.into_prop_frame("length"))?;

    let value = match PropType::from_wire(tag) {
        Some(PropType::Str) => {
            let len = usize::try_from(len)
                .map_err(|_| ObjError::InvalidPropertyFrame("negative length"))?;
            Value::Str(read_fixed_str(cur, len).map_err(|e| e.into_prop_frame("string value"))?)
        }
        Some(PropType::Number) => {
            Value::Number(read_number(cur).map_err(|e| e.into_prop_frame("number value"))?)
        }
        Some(PropType::SyslogTime) => Value::SyslogTime(
            read_syslog_time(cur).map_err(|e| e.into_prop_frame("timestamp value"))?,
        ),
        Some(PropType::None) | None => {
            tracing::debug!(tag, "invalid property type tag");
            return Err(ObjError::InvalidPropertyFrame("unknown type tag"));
        }
    };

    if cur.next_char()? != b'\n' {
        return Err(ObjError::InvalidPropertyFrame("missing line end"));
    }

    Ok(PropertyLine::Property(Property { name, value }))
}

/// `>End\n.\n`
pub fn read_trailer(cur: &mut PeekCursor<'_>) -> ObjResult<()> {
    for &b in &[COOKIE_ENDLINE, b'E', b'n', b'd', b'\n', COOKIE_BLANKLINE, b'\n'] {
        cur.expect(b, ObjError::InvalidTrailer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStrm;

    fn with_cursor<T>(input: &[u8], f: impl FnOnce(&mut PeekCursor<'_>) -> T) -> T {
        let mut strm = MemStrm::from_bytes(input);
        let mut cur = PeekCursor::new(&mut strm);
        f(&mut cur)
    }

    #[test]
    fn test_number() {
        assert_eq!(with_cursor(b"42:", read_number).unwrap(), 42);
        assert_eq!(with_cursor(b"-42:", read_number).unwrap(), -42);
        assert_eq!(with_cursor(b"0:", read_number).unwrap(), 0);
        assert_eq!(
            with_cursor(b"-9223372036854775808:", read_number).unwrap(),
            i64::MIN
        );
    }

    #[test]
    fn test_number_errors() {
        assert!(matches!(with_cursor(b"x1:", read_number), Err(ObjError::InvalidNumber)));
        assert!(matches!(with_cursor(b"-:", read_number), Err(ObjError::InvalidNumber)));
        assert!(matches!(
            with_cursor(b"12;", read_number),
            Err(ObjError::InvalidDelimiter(b';'))
        ));
        assert!(matches!(
            with_cursor(b"9223372036854775808:", read_number),
            Err(ObjError::InvalidNumber)
        ));
        assert!(matches!(with_cursor(b"12", read_number), Err(ObjError::EndOfStream)));
    }

    #[test]
    fn test_fixed_str() {
        let s = with_cursor(b"a:b:c:", |cur| read_fixed_str(cur, 5)).unwrap();
        assert_eq!(s.as_bytes(), b"a:b:c");

        let empty = with_cursor(b":", |cur| read_fixed_str(cur, 0)).unwrap();
        assert!(empty.is_empty());

        assert!(matches!(
            with_cursor(b"abcd", |cur| read_fixed_str(cur, 3)),
            Err(ObjError::InvalidDelimiter(b'd'))
        ));
    }

    #[test]
    fn test_syslog_time() {
        let ts = with_cursor(b"2:2008:1:7:13:45:9:123:3:+:1:0:", read_syslog_time).unwrap();
        assert_eq!(ts.time_type, 2);
        assert_eq!(ts.year, 2008);
        assert_eq!(ts.secfrac, 123);
        assert_eq!(ts.secfrac_precision, 3);
        assert_eq!(ts.offset_mode, b'+');
        assert_eq!(ts.offset_hour, 1);
        assert_eq!(ts.offset_minute, 0);

        // Offset sign must be followed by a delimiter
        assert!(matches!(
            with_cursor(b"2:2008:1:7:13:45:9:123:3:+x1:0:", read_syslog_time),
            Err(ObjError::InvalidDelimiter(b'x'))
        ));
    }

    #[test]
    fn test_header() {
        let header = with_cursor(b"<Obj:1:7:3:msg:\n", |cur| {
            read_header(cur, RecordKind::Object)
        })
        .unwrap();
        assert_eq!(header.class_id, ClassId::new_const(7));
        assert_eq!(header.version, 3);
        assert_eq!(header.kind, RecordKind::Object);
    }

    #[test]
    fn test_header_errors() {
        let read = |input: &[u8], kind| with_cursor(input, |cur| read_header(cur, kind));

        assert!(matches!(
            read(b"+Obj:1:7:3:x:\n", RecordKind::Object),
            Err(ObjError::InvalidHeaderCookie)
        ));
        assert!(matches!(
            read(b"<OPB:1:7:3:x:\n", RecordKind::Object),
            Err(ObjError::InvalidHeaderKindTag)
        ));
        assert!(matches!(
            read(b"<Obj;1:7:3:x:\n", RecordKind::Object),
            Err(ObjError::InvalidHeaderCookie)
        ));
        assert!(matches!(
            read(b"<Obj:2:7:3:x:\n", RecordKind::Object),
            Err(ObjError::InvalidHeaderFormatVersion)
        ));
        assert!(matches!(
            read(b"<OPB:1:0:3:x:\n", RecordKind::PropertyBag),
            Err(ObjError::InvalidClassId(0))
        ));
        assert!(matches!(
            read(b"<OPB:1:100:3:x:\n", RecordKind::PropertyBag),
            Err(ObjError::InvalidClassId(100))
        ));
    }

    #[test]
    fn test_property_lines() {
        let input = b"+pszName:1:5:queue:\n+iNum:2:3:-42:\n>End\n.\n";
        let mut strm = MemStrm::from_bytes(input);
        let mut cur = PeekCursor::new(&mut strm);

        let first = read_property(&mut cur).unwrap();
        assert_eq!(
            first,
            PropertyLine::Property(Property::new("pszName", Value::Str("queue".into())))
        );
        let second = read_property(&mut cur).unwrap();
        assert_eq!(
            second,
            PropertyLine::Property(Property::new("iNum", Value::Number(-42)))
        );

        // Trailer cookie ends the list and is left for the trailer parser
        assert_eq!(read_property(&mut cur).unwrap(), PropertyLine::EndOfList);
        read_trailer(&mut cur).unwrap();
    }

    #[test]
    fn test_property_frame_errors() {
        let bad = [
            &b"+name:9:1:x:\n"[..],
            b"+name:0:0::\n",
            b"+name:x:1:a:\n",
            b"+name:1:-1:a:\n",
            b"+name:1:1:ab:\n",
            b"+name:2:2:12:x",
            b"+na\nme:2:2:12:\n",
        ];
        for input in bad {
            let result = with_cursor(input, read_property);
            assert!(
                matches!(result, Err(ObjError::InvalidPropertyFrame(_))),
                "{:?} gave {:?}",
                String::from_utf8_lossy(input),
                result
            );
        }
    }

    #[test]
    fn test_trailer_errors() {
        for input in [&b">end\n.\n"[..], b">End\n\n", b"<End\n.\n", b">End.\n"] {
            assert!(matches!(
                with_cursor(input, read_trailer),
                Err(ObjError::InvalidTrailer)
            ));
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_number_text_parses_back(n in proptest::num::i64::ANY) {
            let text = format!("{}:", n);
            proptest::prop_assert_eq!(with_cursor(text.as_bytes(), read_number).unwrap(), n);
        }

        #[test]
        fn prop_arbitrary_property_bytes_never_panic(input in proptest::collection::vec(proptest::num::u8::ANY, 0..64)) {
            let mut bytes = b"+".to_vec();
            bytes.extend_from_slice(&input);
            let _ = with_cursor(&bytes, read_property);
        }
    }
}
