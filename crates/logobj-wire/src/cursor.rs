//! Peekable read cursor over a stream
//!
//! Holds at most one byte of lookahead. The parser uses it to peek at line
//! cookies, and the resync scanner to hand a found header cookie back to the
//! header parser.

use logobj_core::{ObjError, ObjResult, Strm};

pub struct PeekCursor<'s> {
    strm: &'s mut dyn Strm,
    lookahead: Option<u8>,
    /// Last byte handed out by `next_char`
    last: Option<u8>,
    consumed: u64,
}

impl<'s> PeekCursor<'s> {
    pub fn new(strm: &'s mut dyn Strm) -> Self {
        PeekCursor {
            strm,
            lookahead: None,
            last: None,
            consumed: 0,
        }
    }

    /// Consume one byte
    #[inline]
    pub fn next_char(&mut self) -> ObjResult<u8> {
        let c = match self.lookahead.take() {
            Some(c) => c,
            None => self.strm.read_char()?,
        };
        self.last = Some(c);
        self.consumed += 1;
        Ok(c)
    }

    /// Put one consumed byte back
    pub fn unread(&mut self, c: u8) -> ObjResult<()> {
        if self.lookahead.is_some() {
            return Err(ObjError::UnreadOverflow);
        }
        self.lookahead = Some(c);
        self.consumed = self.consumed.saturating_sub(1);
        Ok(())
    }

    /// Look at the next byte without consuming it
    pub fn peek(&mut self) -> ObjResult<u8> {
        if let Some(c) = self.lookahead {
            return Ok(c);
        }
        let c = self.strm.read_char()?;
        self.lookahead = Some(c);
        Ok(c)
    }

    /// Consume one byte and require it to be `want`
    #[inline]
    pub fn expect(&mut self, want: u8, err: ObjError) -> ObjResult<()> {
        if self.next_char()? != want {
            return Err(err);
        }
        Ok(())
    }

    #[inline]
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    /// Bytes consumed through this cursor so far
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Hand a pending lookahead byte back to the underlying stream
    pub fn release(&mut self) -> ObjResult<()> {
        match self.lookahead.take() {
            Some(c) => self.strm.unread_char(c),
            None => Ok(()),
        }
    }
}

impl Drop for PeekCursor<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("dropping lookahead byte: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStrm;

    #[test]
    fn test_peek_then_next() {
        let mut strm = MemStrm::from_bytes(b"ab");
        let mut cur = PeekCursor::new(&mut strm);

        assert_eq!(cur.peek().unwrap(), b'a');
        assert_eq!(cur.peek().unwrap(), b'a');
        assert_eq!(cur.next_char().unwrap(), b'a');
        assert_eq!(cur.next_char().unwrap(), b'b');
        assert!(matches!(cur.next_char(), Err(ObjError::EndOfStream)));
        assert_eq!(cur.consumed(), 2);
    }

    #[test]
    fn test_single_slot_unread() {
        let mut strm = MemStrm::from_bytes(b"xy");
        let mut cur = PeekCursor::new(&mut strm);

        let c = cur.next_char().unwrap();
        cur.unread(c).unwrap();
        assert!(matches!(cur.unread(b'z'), Err(ObjError::UnreadOverflow)));
        assert_eq!(cur.next_char().unwrap(), b'x');
        assert_eq!(cur.last(), Some(b'x'));
    }

    #[test]
    fn test_release_returns_lookahead_to_stream() {
        let mut strm = MemStrm::from_bytes(b"qr");
        {
            let mut cur = PeekCursor::new(&mut strm);
            assert_eq!(cur.peek().unwrap(), b'q');
        }
        // The peeked byte was handed back on drop
        assert_eq!(strm.read_char().unwrap(), b'q');
        assert_eq!(strm.read_char().unwrap(), b'r');
    }
}
