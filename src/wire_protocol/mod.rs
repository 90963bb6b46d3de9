//! Legacy opcode wire format: headers, `OP_INSERT`/`OP_UPDATE`/`OP_DELETE`/
//! `OP_QUERY` encoding, and `OP_REPLY` decoding.

pub mod flags;
pub mod operations;

pub use self::operations::{Message, MsgHeader, OpCode, RequestIdGenerator, HEADER_LEN};
