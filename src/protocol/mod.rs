//! Protocol Module
//!
//! RESP (REdis Serialization Protocol) values and their wire codec.
//!
//! ## Frame Format
//!
//! Every frame starts with a one byte marker and ends with `\r\n`:
//!
//! ```text
//! ┌──────────┬────────────────────────────┬──────────┐
//! │Marker (1)│  Payload / <len> / <count> │   CRLF   │
//! └──────────┴────────────────────────────┴──────────┘
//! ```
//!
//! ### Markers
//! - `*` Array      - `<count>\r\n` then `count` values
//! - `+` Simple     - `<text>\r\n`
//! - `$` Bulk       - `<len>\r\n<bytes>\r\n`, `-1\r\n` for null
//! - `:` Integer    - `<signed int>\r\n`
//! - `-` Error      - `<message>\r\n`
//! - `#` Boolean    - `t\r\n` / `f\r\n`
//! - `,` Double     - `<decimal>\r\n`
//! - `_` Null       - `\r\n`
//! - `(` BigNumber, `!` BulkError, `=` Verbatim, `%` Map, `~` Set, `>` Push
//!
//! ### Data Flow
//! ```text
//! bytes ─► peek_kind ─► Decoder ─► Value ─► Command ─► Engine ─► Value ─► Encoder ─► bytes
//! ```

mod value;
mod marker;
mod decoder;
mod encoder;
mod codec;
mod command;

pub use value::Value;
pub use marker::{peek_kind, ValueKind};
pub use decoder::{
    decode, decode_array, decode_boolean, decode_bulk_string, decode_double, decode_error,
    decode_integer, decode_null, decode_simple_string, Decoder,
};
pub use encoder::{encode, encode_into, format_double, Encoder};
pub use codec::{read_value, write_value, write_value_with, READ_CHUNK_SIZE};
pub use command::{ClientCommand, Command, CommandError};
