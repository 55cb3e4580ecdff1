//! Error types for the object runtime

use thiserror::Error;

use crate::{ClassId, MethodSlot};

/// Core object runtime errors
#[derive(Error, Debug)]
pub enum ObjError {
    // Registry errors
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Invalid class id: {0}")]
    InvalidClassId(i64),

    #[error("Class {0} is not registered")]
    ClassNotRegistered(ClassId),

    #[error("Class {0} is already registered")]
    ClassAlreadyRegistered(ClassId),

    // Dispatch errors
    #[error("Interface version {requested} not supported (supported {min}..={max})")]
    InterfaceVersionMismatch { requested: u32, min: u32, max: u32 },

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Method not implemented: {0:?}")]
    NotImplemented(MethodSlot),

    #[error("Handler does not fit slot {slot:?}")]
    MethodSlotMismatch { slot: MethodSlot },

    // Header errors
    #[error("Invalid header cookie")]
    InvalidHeaderCookie,

    #[error("Invalid header record type")]
    InvalidHeaderKindTag,

    #[error("Invalid serializer format version")]
    InvalidHeaderFormatVersion,

    // Field errors
    #[error("Invalid delimiter: {0:#04x}")]
    InvalidDelimiter(u8),

    #[error("Invalid number")]
    InvalidNumber,

    #[error("Invalid property frame: {0}")]
    InvalidPropertyFrame(&'static str),

    #[error("Invalid property name: {0:?}")]
    InvalidPropertyName(String),

    #[error("Invalid trailer")]
    InvalidTrailer,

    #[error("Buffer too small: needed {needed}, capacity {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    // Stream errors
    #[error("End of stream")]
    EndOfStream,

    #[error("Pushback slot already occupied")]
    UnreadOverflow,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObjError {
    /// Re-tag a field level grammar error raised inside a property line
    pub fn into_prop_frame(self, what: &'static str) -> ObjError {
        match self {
            ObjError::InvalidNumber | ObjError::InvalidDelimiter(_) => {
                ObjError::InvalidPropertyFrame(what)
            }
            other => other,
        }
    }

    /// Whether this error came from the header grammar and may be recovered
    /// from by resyncing to the next record boundary
    pub fn is_header_recoverable(&self) -> bool {
        !matches!(self, ObjError::EndOfStream | ObjError::Io(_) | ObjError::UnreadOverflow)
    }
}

/// Result type for object runtime operations
pub type ObjResult<T> = Result<T, ObjError>;
