//! Byte stream boundary
//!
//! The serializer writes and the deserializer reads through this trait.
//! Implementations own buffering, record transactions and whatever locking
//! the host needs; the object runtime only ever drives one stream at a time.

use crate::{NumberFmt, ObjResult};

pub trait Strm {
    fn write_char(&mut self, c: u8) -> ObjResult<()>;

    fn write(&mut self, buf: &[u8]) -> ObjResult<()>;

    /// Write a decimal integer
    fn write_long(&mut self, n: i64) -> ObjResult<()> {
        let mut fmt = NumberFmt::new();
        self.write(fmt.format(n))
    }

    /// Next byte, or `ObjError::EndOfStream` once exhausted
    fn read_char(&mut self) -> ObjResult<u8>;

    /// Return one byte to the stream. Only a single byte may be pending;
    /// a second call fails with `ObjError::UnreadOverflow`.
    fn unread_char(&mut self, c: u8) -> ObjResult<()>;

    /// Open a record transaction
    fn record_begin(&mut self) -> ObjResult<()>;

    /// Commit the pending record
    fn record_end(&mut self) -> ObjResult<()>;

    /// Discard the pending record
    fn record_abort(&mut self) -> ObjResult<()> {
        Ok(())
    }
}
