//! The RPC transport boundary.
//!
//! Connection establishment, TLS negotiation, and server selection are
//! out of scope for this crate -- they belong to the driver's topology
//! layer. What the executors need is the ability to send one of the four
//! legacy opcodes or one modern command and get a reply document back;
//! that's `Transport`. `WireTransport` is a reference implementation over
//! a single buffered TCP/TLS stream, reusing `BufConnection` to show how
//! a caller would wire this core up to a real socket, but it does not
//! attempt reconnection, pooling, or multi-server routing.

use bson::Document;

use buf_connection::BufConnection;
use error::Result;
use server::Hint;
use wire_protocol::flags::OpQueryFlags;
use wire_protocol::{Message, RequestIdGenerator};

/// Everything the write-command executors need from the connection
/// layer: send one of the legacy opcodes, or run one command, against
/// the server identified by `hint`.
pub trait Transport {
    /// Sends `OP_INSERT` carrying `documents` and, if `with_reply` is
    /// true, follows up with a `getLastError` round-trip and returns its
    /// reply document.
    fn send_insert(&mut self,
                    hint: Hint,
                    namespace: &str,
                    flags: i32,
                    documents: &[&Document],
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>>;

    /// Sends `OP_UPDATE` and, if `with_reply` is true, follows up with a
    /// `getLastError` round-trip.
    fn send_update(&mut self,
                    hint: Hint,
                    namespace: &str,
                    flags: i32,
                    selector: &Document,
                    update: &Document,
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>>;

    /// Sends `OP_DELETE` and, if `with_reply` is true, follows up with a
    /// `getLastError` round-trip.
    fn send_delete(&mut self,
                    hint: Hint,
                    namespace: &str,
                    flags: i32,
                    selector: &Document,
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>>;

    /// Runs a write command (`insert`/`update`/`delete`) against
    /// `<database>.$cmd` and returns its reply document.
    fn run_command(&mut self, hint: Hint, database: &str, command: &Document) -> Result<Document>;
}

/// Reference `Transport` over a single `BufConnection`.
pub struct WireTransport {
    connection: BufConnection,
    request_ids: RequestIdGenerator,
}

impl WireTransport {
    pub fn new(connection: BufConnection) -> WireTransport {
        WireTransport {
            connection: connection,
            request_ids: RequestIdGenerator::new(),
        }
    }

    fn send(&mut self, message: &Message) -> Result<()> {
        use std::io::Write;

        let bytes = try!(message.encode(self.request_ids.next()));
        try!(self.connection.write_all(&bytes));
        try!(self.connection.flush());
        Ok(())
    }

    fn recv_reply(&mut self) -> Result<Document> {
        use std::io::Read;
        use byteorder::{LittleEndian, ByteOrder};

        let mut len_buf = [0u8; 4];
        try!(self.connection.read_exact(&mut len_buf));
        let total_len = LittleEndian::read_i32(&len_buf) as usize;

        let mut rest = vec![0u8; total_len - 4];
        try!(self.connection.read_exact(&mut rest));

        let mut full = Vec::with_capacity(total_len);
        full.extend_from_slice(&len_buf);
        full.extend_from_slice(&rest);

        ::wire_protocol::operations::decode_reply_document(&full)
    }

    fn get_last_error(&mut self, database: &str) -> Result<Document> {
        let mut cmd = Document::new();
        cmd.insert("getLastError".to_owned(), ::bson::Bson::I32(1));

        let namespace = format!("{}.$cmd", database);
        let message = Message::Query {
            flags: OpQueryFlags::none().bits(),
            namespace: &namespace,
            number_to_skip: 0,
            number_to_return: -1,
            query: &cmd,
        };

        try!(self.send(&message));
        self.recv_reply()
    }
}

impl Transport for WireTransport {
    fn send_insert(&mut self,
                    _hint: Hint,
                    namespace: &str,
                    flags: i32,
                    documents: &[&Document],
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>> {
        let message = Message::Insert {
            flags: flags,
            namespace: namespace,
            documents: documents,
        };
        try!(self.send(&message));

        if with_reply {
            Ok(Some(try!(self.get_last_error(gle_database))))
        } else {
            Ok(None)
        }
    }

    fn send_update(&mut self,
                    _hint: Hint,
                    namespace: &str,
                    flags: i32,
                    selector: &Document,
                    update: &Document,
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>> {
        let message = Message::Update {
            flags: flags,
            namespace: namespace,
            selector: selector,
            update: update,
        };
        try!(self.send(&message));

        if with_reply {
            Ok(Some(try!(self.get_last_error(gle_database))))
        } else {
            Ok(None)
        }
    }

    fn send_delete(&mut self,
                    _hint: Hint,
                    namespace: &str,
                    flags: i32,
                    selector: &Document,
                    with_reply: bool,
                    gle_database: &str)
                    -> Result<Option<Document>> {
        let message = Message::Delete {
            flags: flags,
            namespace: namespace,
            selector: selector,
        };
        try!(self.send(&message));

        if with_reply {
            Ok(Some(try!(self.get_last_error(gle_database))))
        } else {
            Ok(None)
        }
    }

    fn run_command(&mut self, _hint: Hint, database: &str, command: &Document) -> Result<Document> {
        let namespace = format!("{}.$cmd", database);
        let message = Message::Query {
            flags: OpQueryFlags::none().bits(),
            namespace: &namespace,
            number_to_skip: 0,
            number_to_return: -1,
            query: command,
        };

        try!(self.send(&message));
        self.recv_reply()
    }
}
