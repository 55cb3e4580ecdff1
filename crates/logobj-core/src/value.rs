//! Property values carried across the wire
//!
//! Writers hand the serializer a borrowed [`PropValue`] in whatever native
//! width they store it in. Readers get back an owned [`Value`] in one of the
//! three wire shapes (string, number, timestamp).

use std::fmt;
use std::io::{self, Write};

use bytes::Bytes;

use crate::{ObjError, ObjResult};

/// Scratch space used when rendering a timestamp (one byte kept spare)
pub const TIME_SCRATCH_LEN: usize = 64;

/// Wire type tag of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropType {
    /// No value set. Never written, rejected on read.
    None = 0,
    Str = 1,
    Number = 2,
    SyslogTime = 3,
}

impl PropType {
    pub fn from_wire(n: i64) -> Option<Self> {
        match n {
            0 => Some(PropType::None),
            1 => Some(PropType::Str),
            2 => Some(PropType::Number),
            3 => Some(PropType::SyslogTime),
            _ => None,
        }
    }

    #[inline]
    pub fn to_wire(self) -> i64 {
        self as i64
    }
}

/// Length-carrying immutable byte string
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct CountedStr(Bytes);

impl CountedStr {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        CountedStr(bytes.into())
    }

    pub const fn from_static(s: &'static str) -> Self {
        CountedStr(Bytes::from_static(s.as_bytes()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// UTF-8 view, if the bytes happen to be valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Debug for CountedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for CountedStr {
    fn from(s: &str) -> Self {
        CountedStr(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for CountedStr {
    fn from(s: String) -> Self {
        CountedStr(Bytes::from(s))
    }
}

impl From<Vec<u8>> for CountedStr {
    fn from(v: Vec<u8>) -> Self {
        CountedStr(Bytes::from(v))
    }
}

/// Composite syslog timestamp (12 wire subfields)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyslogTime {
    /// Discriminator: 0 = unset, 1 = RFC 3164, 2 = RFC 3339
    pub time_type: u8,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
    /// Fractional seconds value
    pub secfrac: i32,
    /// Number of digits in `secfrac`
    pub secfrac_precision: i32,
    /// Offset sign, `b'+'` or `b'-'`
    pub offset_mode: u8,
    pub offset_hour: i32,
    pub offset_minute: i32,
}

impl Default for SyslogTime {
    fn default() -> Self {
        SyslogTime {
            time_type: 0,
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            secfrac: 0,
            secfrac_precision: 0,
            offset_mode: b'+',
            offset_hour: 0,
            offset_minute: 0,
        }
    }
}

impl SyslogTime {
    /// Render the 12 colon separated subfields into a bounded scratch buffer
    pub fn render(&self) -> ObjResult<TimeText> {
        let mut text = TimeText {
            buf: [0u8; TIME_SCRATCH_LEN],
            len: 0,
        };
        let capacity = TIME_SCRATCH_LEN - 1;
        let mut cursor = io::Cursor::new(&mut text.buf[..capacity]);

        if self.write_fields(&mut cursor).is_err() {
            return Err(ObjError::BufferTooSmall {
                needed: self.rendered_len(),
                capacity,
            });
        }

        text.len = cursor.position() as usize;
        Ok(text)
    }

    fn write_fields<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "{}:{}:{}:{}:{}:{}:{}:{}:{}:",
            self.time_type,
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.secfrac,
            self.secfrac_precision
        )?;
        // Offset sign goes out as a raw byte, never as a UTF-8 char
        w.write_all(&[self.offset_mode])?;
        write!(w, ":{}:{}", self.offset_hour, self.offset_minute)
    }

    fn rendered_len(&self) -> usize {
        let mut sink = Vec::new();
        let _ = self.write_fields(&mut sink);
        sink.len()
    }
}

/// Rendered timestamp text
#[derive(Clone, Copy)]
pub struct TimeText {
    buf: [u8; TIME_SCRATCH_LEN],
    len: usize,
}

impl TimeText {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Shared decimal formatter for every integer width written to a stream
#[derive(Default)]
pub struct NumberFmt(itoa::Buffer);

impl NumberFmt {
    pub fn new() -> Self {
        NumberFmt(itoa::Buffer::new())
    }

    #[inline]
    pub fn format(&mut self, n: i64) -> &[u8] {
        self.0.format(n).as_bytes()
    }
}

/// Borrowed property value handed to the serializer
#[derive(Clone, Copy, Debug)]
pub enum PropValue<'a> {
    Psz(&'a str),
    Short(i16),
    Int(i32),
    Long(i64),
    Int64(i64),
    CStr(&'a CountedStr),
    SyslogTime(&'a SyslogTime),
}

impl PropValue<'_> {
    pub fn prop_type(&self) -> PropType {
        match self {
            PropValue::Psz(_) | PropValue::CStr(_) => PropType::Str,
            PropValue::Short(_) | PropValue::Int(_) | PropValue::Long(_) | PropValue::Int64(_) => {
                PropType::Number
            }
            PropValue::SyslogTime(_) => PropType::SyslogTime,
        }
    }
}

impl<'a> From<&'a str> for PropValue<'a> {
    fn from(s: &'a str) -> Self {
        PropValue::Psz(s)
    }
}

impl<'a> From<&'a CountedStr> for PropValue<'a> {
    fn from(s: &'a CountedStr) -> Self {
        PropValue::CStr(s)
    }
}

impl<'a> From<&'a SyslogTime> for PropValue<'a> {
    fn from(t: &'a SyslogTime) -> Self {
        PropValue::SyslogTime(t)
    }
}

impl From<i16> for PropValue<'_> {
    fn from(n: i16) -> Self {
        PropValue::Short(n)
    }
}

impl From<i32> for PropValue<'_> {
    fn from(n: i32) -> Self {
        PropValue::Int(n)
    }
}

impl From<i64> for PropValue<'_> {
    fn from(n: i64) -> Self {
        PropValue::Int64(n)
    }
}

/// Owned value read back from the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Str(CountedStr),
    Number(i64),
    SyslogTime(SyslogTime),
}

impl Value {
    pub fn prop_type(&self) -> PropType {
        match self {
            Value::Str(_) => PropType::Str,
            Value::Number(_) => PropType::Number,
            Value::SyslogTime(_) => PropType::SyslogTime,
        }
    }
}

/// One name/value pair read from a property line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: Value,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Property {
            name: name.into(),
            value,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> Option<&CountedStr> {
        match &self.value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self.value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&SyslogTime> {
        match &self.value {
            Value::SyslogTime(t) => Some(t),
            _ => None,
        }
    }
}
