//! Reference stream implementations
//!
//! - [`MemStrm`]: in-memory, readable and writable, transactional
//! - [`ReaderStrm`]: read-only over any `BufRead` (queue files on disk)
//! - [`WriterStrm`]: write-only, forwards whole records to any `Write`

use std::io::{self, BufRead, Write};

use bytes::{BufMut, BytesMut};
use logobj_core::{ObjError, ObjResult, Strm};

fn unsupported(what: &'static str) -> ObjError {
    ObjError::Io(io::Error::new(io::ErrorKind::Unsupported, what))
}

/// In-memory stream. Writes append, reads consume from the front.
#[derive(Debug, Default)]
pub struct MemStrm {
    buf: BytesMut,
    read_pos: usize,
    /// Buffer length at `record_begin`, for abort
    record_mark: Option<usize>,
    pushback: Option<u8>,
}

impl MemStrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream positioned at the start of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        MemStrm {
            buf: BytesMut::from(bytes),
            ..Self::default()
        }
    }

    /// Everything written so far, including already read bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes not yet read (pushback excluded)
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.read_pos..]
    }

    pub fn in_record(&self) -> bool {
        self.record_mark.is_some()
    }

    pub fn into_bytes(self) -> BytesMut {
        self.buf
    }
}

impl Strm for MemStrm {
    fn write_char(&mut self, c: u8) -> ObjResult<()> {
        self.buf.put_u8(c);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> ObjResult<()> {
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    fn read_char(&mut self) -> ObjResult<u8> {
        if let Some(c) = self.pushback.take() {
            return Ok(c);
        }
        let c = *self.buf.get(self.read_pos).ok_or(ObjError::EndOfStream)?;
        self.read_pos += 1;
        Ok(c)
    }

    fn unread_char(&mut self, c: u8) -> ObjResult<()> {
        if self.pushback.is_some() {
            return Err(ObjError::UnreadOverflow);
        }
        self.pushback = Some(c);
        Ok(())
    }

    fn record_begin(&mut self) -> ObjResult<()> {
        self.record_mark = Some(self.buf.len());
        Ok(())
    }

    fn record_end(&mut self) -> ObjResult<()> {
        self.record_mark = None;
        Ok(())
    }

    fn record_abort(&mut self) -> ObjResult<()> {
        if let Some(mark) = self.record_mark.take() {
            self.buf.truncate(mark.max(self.read_pos));
        }
        Ok(())
    }
}

/// Read-only stream over a buffered reader
#[derive(Debug)]
pub struct ReaderStrm<R> {
    inner: R,
    pushback: Option<u8>,
}

impl<R: BufRead> ReaderStrm<R> {
    pub fn new(inner: R) -> Self {
        ReaderStrm {
            inner,
            pushback: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> Strm for ReaderStrm<R> {
    fn write_char(&mut self, _c: u8) -> ObjResult<()> {
        Err(unsupported("write to read-only stream"))
    }

    fn write(&mut self, _buf: &[u8]) -> ObjResult<()> {
        Err(unsupported("write to read-only stream"))
    }

    fn read_char(&mut self) -> ObjResult<u8> {
        if let Some(c) = self.pushback.take() {
            return Ok(c);
        }
        loop {
            let c = match self.inner.fill_buf() {
                Ok([]) => return Err(ObjError::EndOfStream),
                Ok(available) => available[0],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.inner.consume(1);
            return Ok(c);
        }
    }

    fn unread_char(&mut self, c: u8) -> ObjResult<()> {
        if self.pushback.is_some() {
            return Err(ObjError::UnreadOverflow);
        }
        self.pushback = Some(c);
        Ok(())
    }

    fn record_begin(&mut self) -> ObjResult<()> {
        Err(unsupported("record on read-only stream"))
    }

    fn record_end(&mut self) -> ObjResult<()> {
        Err(unsupported("record on read-only stream"))
    }
}

/// Write-only stream. Bytes written inside a record are held back until
/// `record_end`, so an aborted record never reaches the writer.
#[derive(Debug)]
pub struct WriterStrm<W: Write> {
    inner: W,
    pending: BytesMut,
    in_record: bool,
    records: u64,
}

impl<W: Write> WriterStrm<W> {
    pub fn new(inner: W) -> Self {
        WriterStrm {
            inner,
            pending: BytesMut::new(),
            in_record: false,
            records: 0,
        }
    }

    /// Records committed to the writer
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer. A record still open is discarded.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Strm for WriterStrm<W> {
    fn write_char(&mut self, c: u8) -> ObjResult<()> {
        self.write(&[c])
    }

    fn write(&mut self, buf: &[u8]) -> ObjResult<()> {
        if self.in_record {
            self.pending.extend_from_slice(buf);
        } else {
            self.inner.write_all(buf)?;
        }
        Ok(())
    }

    fn read_char(&mut self) -> ObjResult<u8> {
        Err(unsupported("read from write-only stream"))
    }

    fn unread_char(&mut self, _c: u8) -> ObjResult<()> {
        Err(unsupported("read from write-only stream"))
    }

    fn record_begin(&mut self) -> ObjResult<()> {
        self.pending.clear();
        self.in_record = true;
        Ok(())
    }

    fn record_end(&mut self) -> ObjResult<()> {
        self.in_record = false;
        self.inner.write_all(&self.pending)?;
        self.inner.flush()?;
        self.pending.clear();
        self.records += 1;
        Ok(())
    }

    fn record_abort(&mut self) -> ObjResult<()> {
        self.in_record = false;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_strm_abort_discards_record() {
        let mut strm = MemStrm::new();
        strm.write(b"kept").unwrap();
        strm.record_begin().unwrap();
        strm.write(b"dropped").unwrap();
        assert!(strm.in_record());
        strm.record_abort().unwrap();
        assert_eq!(strm.as_bytes(), b"kept");
        assert!(!strm.in_record());
    }

    #[test]
    fn test_mem_strm_pushback() {
        let mut strm = MemStrm::from_bytes(b"ab");
        let c = strm.read_char().unwrap();
        strm.unread_char(c).unwrap();
        assert!(matches!(strm.unread_char(b'z'), Err(ObjError::UnreadOverflow)));
        assert_eq!(strm.read_char().unwrap(), b'a');
        assert_eq!(strm.remaining(), b"b");
        assert_eq!(strm.read_char().unwrap(), b'b');
        assert!(matches!(strm.read_char(), Err(ObjError::EndOfStream)));
    }

    #[test]
    fn test_reader_strm() {
        let mut strm = ReaderStrm::new(io::Cursor::new(b"xy".to_vec()));
        assert_eq!(strm.read_char().unwrap(), b'x');
        strm.unread_char(b'x').unwrap();
        assert_eq!(strm.read_char().unwrap(), b'x');
        assert_eq!(strm.read_char().unwrap(), b'y');
        assert!(matches!(strm.read_char(), Err(ObjError::EndOfStream)));
        assert!(matches!(strm.write(b"no"), Err(ObjError::Io(_))));
    }

    #[test]
    fn test_writer_strm_commits_whole_records() {
        let mut strm = WriterStrm::new(Vec::new());
        strm.record_begin().unwrap();
        strm.write(b"one").unwrap();
        assert!(strm.get_ref().is_empty());
        strm.record_end().unwrap();

        strm.record_begin().unwrap();
        strm.write(b"two").unwrap();
        strm.record_abort().unwrap();

        assert_eq!(strm.records(), 1);
        assert_eq!(strm.into_inner(), b"one");
    }
}
