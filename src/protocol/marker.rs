//! Type dispatch
//!
//! Maps the leading marker byte of a frame to the kind of value that follows.
//! The marker set is part of the wire contract, so it is a closed table.

use std::fmt;

use crate::error::CodecError;

/// The kind of a RESP value, one per marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Array,
    SimpleString,
    BulkString,
    Integer,
    Error,
    Boolean,
    Double,
    BigNumber,
    BulkError,
    VerbatimString,
    Map,
    Set,
    Push,
    Null,
}

/// Marker byte -> kind, indexed directly by the byte
const MARKER_TABLE: [Option<ValueKind>; 256] = {
    let mut table = [None; 256];
    table[b'*' as usize] = Some(ValueKind::Array);
    table[b'+' as usize] = Some(ValueKind::SimpleString);
    table[b'$' as usize] = Some(ValueKind::BulkString);
    table[b':' as usize] = Some(ValueKind::Integer);
    table[b'-' as usize] = Some(ValueKind::Error);
    table[b'#' as usize] = Some(ValueKind::Boolean);
    table[b',' as usize] = Some(ValueKind::Double);
    table[b'(' as usize] = Some(ValueKind::BigNumber);
    table[b'!' as usize] = Some(ValueKind::BulkError);
    table[b'=' as usize] = Some(ValueKind::VerbatimString);
    table[b'%' as usize] = Some(ValueKind::Map);
    table[b'~' as usize] = Some(ValueKind::Set);
    table[b'>' as usize] = Some(ValueKind::Push);
    table[b'_' as usize] = Some(ValueKind::Null);
    table
};

impl ValueKind {
    /// Look up the kind for a marker byte
    #[inline]
    pub const fn from_marker(byte: u8) -> Option<ValueKind> {
        MARKER_TABLE[byte as usize]
    }

    /// The marker byte that introduces this kind on the wire
    pub const fn marker(self) -> u8 {
        match self {
            ValueKind::Array => b'*',
            ValueKind::SimpleString => b'+',
            ValueKind::BulkString => b'$',
            ValueKind::Integer => b':',
            ValueKind::Error => b'-',
            ValueKind::Boolean => b'#',
            ValueKind::Double => b',',
            ValueKind::BigNumber => b'(',
            ValueKind::BulkError => b'!',
            ValueKind::VerbatimString => b'=',
            ValueKind::Map => b'%',
            ValueKind::Set => b'~',
            ValueKind::Push => b'>',
            ValueKind::Null => b'_',
        }
    }

    /// Kinds whose payload is a sequence of nested values
    pub const fn is_aggregate(self) -> bool {
        matches!(
            self,
            ValueKind::Array | ValueKind::Map | ValueKind::Set | ValueKind::Push
        )
    }

    /// RESP3 kinds gated by `CodecConfig::extended_types`
    pub const fn is_extended(self) -> bool {
        matches!(
            self,
            ValueKind::BigNumber
                | ValueKind::BulkError
                | ValueKind::VerbatimString
                | ValueKind::Map
                | ValueKind::Set
                | ValueKind::Push
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Array => "array",
            ValueKind::SimpleString => "simple string",
            ValueKind::BulkString => "bulk string",
            ValueKind::Integer => "integer",
            ValueKind::Error => "error",
            ValueKind::Boolean => "boolean",
            ValueKind::Double => "double",
            ValueKind::BigNumber => "big number",
            ValueKind::BulkError => "bulk error",
            ValueKind::VerbatimString => "verbatim string",
            ValueKind::Map => "map",
            ValueKind::Set => "set",
            ValueKind::Push => "push",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Peek at the marker under the cursor without consuming it
pub fn peek_kind(buf: &[u8], cursor: usize) -> Result<ValueKind, CodecError> {
    let byte = *buf.get(cursor).ok_or(CodecError::UnterminatedFrame)?;
    ValueKind::from_marker(byte).ok_or(CodecError::UnknownType(byte))
}
