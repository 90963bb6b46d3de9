//! Encoding for the legacy opcodes and decoding of `OP_REPLY`.
//!
//! All integers are little-endian, all strings are null-terminated UTF-8,
//! and every message begins with the same 16-byte header. This is the
//! wire format predating the command protocol; the command protocol
//! itself piggybacks on `OP_QUERY` against a `$cmd` collection, which is
//! why `Message::Query` is reused both for `getLastError` and (by the
//! reference transport) for the modern command path.

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bson::{self, Document};

use error::Result;

pub const HEADER_LEN: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Reply = 1,
    Update = 2001,
    Insert = 2002,
    Query = 2004,
    Delete = 2006,
}

/// The 16-byte header shared by every wire protocol message.
#[derive(Debug, Clone, Copy)]
pub struct MsgHeader {
    pub message_length: i32,
    pub request_id: i32,
    pub response_to: i32,
    pub op_code: i32,
}

impl MsgHeader {
    fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        try!(writer.write_i32::<LittleEndian>(self.message_length));
        try!(writer.write_i32::<LittleEndian>(self.request_id));
        try!(writer.write_i32::<LittleEndian>(self.response_to));
        try!(writer.write_i32::<LittleEndian>(self.op_code));
        Ok(())
    }

    fn read<R: Read>(reader: &mut R) -> io::Result<MsgHeader> {
        Ok(MsgHeader {
            message_length: try!(reader.read_i32::<LittleEndian>()),
            request_id: try!(reader.read_i32::<LittleEndian>()),
            response_to: try!(reader.read_i32::<LittleEndian>()),
            op_code: try!(reader.read_i32::<LittleEndian>()),
        })
    }
}

fn write_cstring<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    try!(writer.write_all(s.as_bytes()));
    try!(writer.write_all(&[0u8]));
    Ok(())
}

/// One outgoing legacy-opcode message.
pub enum Message<'a> {
    Insert {
        flags: i32,
        namespace: &'a str,
        documents: &'a [&'a Document],
    },
    Update {
        flags: i32,
        namespace: &'a str,
        selector: &'a Document,
        update: &'a Document,
    },
    Delete {
        flags: i32,
        namespace: &'a str,
        selector: &'a Document,
    },
    /// Also used to issue `getLastError` and, by the reference transport,
    /// modern write commands against `<db>.$cmd`.
    Query {
        flags: i32,
        namespace: &'a str,
        number_to_skip: i32,
        number_to_return: i32,
        query: &'a Document,
    },
}

impl<'a> Message<'a> {
    fn op_code(&self) -> OpCode {
        match *self {
            Message::Insert { .. } => OpCode::Insert,
            Message::Update { .. } => OpCode::Update,
            Message::Delete { .. } => OpCode::Delete,
            Message::Query { .. } => OpCode::Query,
        }
    }

    fn write_body(&self, buf: &mut Vec<u8>) -> Result<()> {
        match *self {
            Message::Insert { flags, namespace, documents } => {
                try!(buf.write_i32::<LittleEndian>(flags));
                try!(write_cstring(buf, namespace));
                for doc in documents {
                    try!(bson::encode_document(buf, doc));
                }
            }
            Message::Update { flags, namespace, selector, update } => {
                try!(buf.write_i32::<LittleEndian>(0)); // reserved
                try!(write_cstring(buf, namespace));
                try!(buf.write_i32::<LittleEndian>(flags));
                try!(bson::encode_document(buf, selector));
                try!(bson::encode_document(buf, update));
            }
            Message::Delete { flags, namespace, selector } => {
                try!(buf.write_i32::<LittleEndian>(0)); // reserved
                try!(write_cstring(buf, namespace));
                try!(buf.write_i32::<LittleEndian>(flags));
                try!(bson::encode_document(buf, selector));
            }
            Message::Query { flags, namespace, number_to_skip, number_to_return, query } => {
                try!(buf.write_i32::<LittleEndian>(flags));
                try!(write_cstring(buf, namespace));
                try!(buf.write_i32::<LittleEndian>(number_to_skip));
                try!(buf.write_i32::<LittleEndian>(number_to_return));
                try!(bson::encode_document(buf, query));
            }
        }

        Ok(())
    }

    /// Serializes this message with a fresh header, returning the bytes
    /// ready to hand to the transport.
    pub fn encode(&self, request_id: i32) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        try!(self.write_body(&mut body));

        let header = MsgHeader {
            message_length: HEADER_LEN + body.len() as i32,
            request_id: request_id,
            response_to: 0,
            op_code: self.op_code() as i32,
        };

        let mut out = Vec::with_capacity(header.message_length as usize);
        try!(header.write(&mut out));
        out.extend_from_slice(&body);
        Ok(out)
    }
}

/// Decodes an `OP_REPLY` body and returns its first document, which is
/// all a getLastError or command reply ever carries.
pub fn decode_reply_document(bytes: &[u8]) -> Result<Document> {
    let mut cursor = Cursor::new(bytes);
    let header = try!(MsgHeader::read(&mut cursor));
    debug_assert_eq!(header.op_code, OpCode::Reply as i32);

    try!(cursor.read_i32::<LittleEndian>()); // response flags
    try!(cursor.read_i64::<LittleEndian>()); // cursor id
    try!(cursor.read_i32::<LittleEndian>()); // starting from
    let number_returned = try!(cursor.read_i32::<LittleEndian>());

    if number_returned < 1 {
        return Ok(Document::new());
    }

    let doc = try!(bson::decode_document(&mut cursor));
    Ok(doc)
}

/// Monotonic request ids, one instance shared by a `Transport`.
pub struct RequestIdGenerator {
    next: ::std::sync::atomic::AtomicIsize,
}

impl RequestIdGenerator {
    pub fn new() -> RequestIdGenerator {
        RequestIdGenerator { next: ::std::sync::atomic::AtomicIsize::new(1) }
    }

    pub fn next(&self) -> i32 {
        self.next.fetch_add(1, ::std::sync::atomic::Ordering::SeqCst) as i32
    }
}
