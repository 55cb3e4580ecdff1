//! logobj Wire Format - Line oriented object records
//!
//! A record is a header line, any number of property lines and a trailer:
//!
//! ```text
//! <Obj:1:<classId>:<version>:<className>:
//! +<name>:<typeTag>:<length>:<value>:
//! >End
//! .
//! ```
//!
//! Property bags use the `OPB` tag instead of `Obj` and can only be applied
//! to an instance that already exists.

pub mod grammar;
pub mod cursor;
pub mod parse;
pub mod serialize;
pub mod deserialize;
pub mod strm;

pub use grammar::*;
pub use cursor::*;
pub use parse::*;
pub use serialize::*;
pub use deserialize::*;
pub use strm::*;
