//! Picks the command-protocol or legacy-opcode executor for one
//! `WriteCommand` and runs it.
//!
//! Server selection and topology monitoring live in the driver's
//! connection layer, out of scope here; this module takes an already
//! resolved `Hint` and its `ServerDescription` and only makes the
//! executor choice.

use concern::WriteConcern;
use error::{Error, Result};
use server::{Hint, ServerDescription};
use transport::Transport;
use write_command::WriteCommand;
use write_result::WriteResult;
use command_executor;
use legacy_executor;

/// Minimum `max_wire_version` a server must advertise to understand the
/// command protocol (`insert`/`update`/`delete` run as commands rather
/// than legacy opcodes).
pub const WRITE_COMMAND_WIRE_VERSION: i32 = 2;

/// Runs `command` against `server` (identified by `hint`), choosing the
/// executor and substituting `default_write_concern` when the caller
/// didn't specify one.
pub fn execute<T: Transport>(transport: &mut T,
                              server: &ServerDescription,
                              command: &mut WriteCommand,
                              database: &str,
                              collection: &str,
                              write_concern: Option<WriteConcern>,
                              default_write_concern: &WriteConcern,
                              hint: Hint,
                              offset: u32)
                              -> Result<WriteResult> {
    if command.n_documents == 0 {
        return Err(Error::InvalidArgument(command.kind.empty_error_message()));
    }

    let write_concern = write_concern.unwrap_or_else(|| default_write_concern.clone());
    try!(write_concern.is_valid());

    if hint == 0 {
        return Err(Error::InvalidArgument("no server selected for this write".to_owned()));
    }
    command.server_hint = hint;

    let prefer_legacy_unacknowledged = server.min_wire_version == 0 && !write_concern.needs_gle();

    if server.max_wire_version >= WRITE_COMMAND_WIRE_VERSION && !prefer_legacy_unacknowledged {
        debug!("dispatching {} as a command (max_wire_version={})",
               command.kind.op_name(),
               server.max_wire_version);
        command_executor::execute(transport, server, command, database, collection, &write_concern, hint, offset)
    } else {
        debug!("dispatching {} as legacy opcodes (max_wire_version={}, needs_gle={})",
               command.kind.op_name(),
               server.max_wire_version,
               write_concern.needs_gle());
        legacy_executor::execute(transport, server, command, database, collection, &write_concern, hint, offset)
    }
}
