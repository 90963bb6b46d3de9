//! Write-command execution core for a MongoDB driver.
//!
//! Turns a caller's insert/update/delete intent into one or more
//! server-directed requests -- either the command protocol or the
//! legacy opcodes, chosen per server capability -- and folds the
//! replies back into a single result. Connection establishment, TLS,
//! server selection, and the higher-level bulk-write façade are out of
//! scope; see `Transport` and `ServerDescription` for the boundary this
//! crate expects its caller to satisfy.

extern crate bson;
extern crate byteorder;
extern crate bufstream;
extern crate native_tls;

#[macro_use]
extern crate log;

pub mod batch;
pub mod buf_connection;
pub mod command_executor;
pub mod concern;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod legacy_executor;
pub mod oid;
pub mod server;
pub mod testing;
pub mod transport;
pub mod wire_protocol;
pub mod write_command;
pub mod write_result;

pub use concern::{Level, WriteConcern};
pub use dispatcher::{execute, WRITE_COMMAND_WIRE_VERSION};
pub use error::{Error, Result};
pub use oid::ObjectId;
pub use server::{Hint, ServerDescription};
pub use transport::{Transport, WireTransport};
pub use write_command::{Kind, WriteCommand};
pub use write_result::WriteResult;
