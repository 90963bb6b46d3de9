//! Capability metadata for a chosen server.
//!
//! Topology monitoring and server selection are out of scope for this
//! crate (they live in the driver's connection layer); what the
//! write-command core needs from a selected server is just this bundle of
//! limits and wire versions, which it treats as an opaque `hint`.

/// Opaque identifier for a server chosen by the (external) connection
/// layer. `0` is reserved to mean "no server has been selected yet".
pub type Hint = u32;

/// Capability metadata advertised by a server, as negotiated during the
/// initial handshake. The connection layer is expected to cache one of
/// these per server and hand it to the dispatcher alongside a `Hint`.
#[derive(Debug, Clone, Copy)]
pub struct ServerDescription {
    pub min_wire_version: i32,
    pub max_wire_version: i32,
    pub max_bson_obj_size: i32,
    pub max_write_batch_size: i32,
    pub max_msg_size: i32,
}

impl ServerDescription {
    /// Describes a server that only understands the legacy opcodes
    /// (`max_wire_version` below the command-protocol threshold).
    pub fn legacy() -> ServerDescription {
        ServerDescription {
            min_wire_version: 0,
            max_wire_version: 0,
            max_bson_obj_size: 16 * 1024 * 1024,
            max_write_batch_size: 1000,
            max_msg_size: 48 * 1024 * 1024,
        }
    }

    /// Describes a modern server that understands the write commands.
    pub fn modern() -> ServerDescription {
        ServerDescription {
            min_wire_version: 0,
            max_wire_version: 6,
            max_bson_obj_size: 16 * 1024 * 1024,
            max_write_batch_size: 1000,
            max_msg_size: 48 * 1024 * 1024,
        }
    }
}
