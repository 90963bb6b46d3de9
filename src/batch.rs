//! Decides how many clauses fit in the next outgoing request.
//!
//! This is pure arithmetic over the server's advertised limits; it holds
//! no payload and drives no I/O. The executors own the loop that walks a
//! command's payload and asks this planner, clause by clause, whether
//! the next one still fits.

use error::{Error, Result};
use server::ServerDescription;

/// Per-clause bookkeeping overhead of storing it under a stringified
/// array index (`"0"`, `"1"`, ... up to a few digits, plus the BSON
/// element type byte and key nul). Matches the small constant the
/// source budgets for its `bson_t` append-only array trick.
pub const CLAUSE_KEY_OVERHEAD: u32 = 12;

pub struct BatchPlanner {
    max_bson_obj_size: u32,
    max_write_batch_size: u32,
    max_msg_size: u32,
}

impl BatchPlanner {
    pub fn new(server: &ServerDescription) -> BatchPlanner {
        BatchPlanner {
            max_bson_obj_size: server.max_bson_obj_size as u32,
            max_write_batch_size: server.max_write_batch_size as u32,
            max_msg_size: server.max_msg_size as u32,
        }
    }

    /// The total bytes a command-protocol envelope may occupy: the
    /// document size limit plus headroom for the enclosing command.
    pub fn envelope_slack(&self) -> u32 {
        self.max_bson_obj_size + 16_382
    }

    /// True if adding one more clause of `candidate_len` bytes (already
    /// including `CLAUSE_KEY_OVERHEAD`) to a batch that has `accumulated`
    /// bytes and `clauses_included` clauses so far would overflow either
    /// the byte budget or the count budget.
    pub fn would_overflow(&self, accumulated: u32, candidate_len: u32, clauses_included: u32) -> bool {
        if accumulated + candidate_len > self.envelope_slack() {
            return true;
        }

        if self.max_write_batch_size > 0 && clauses_included >= self.max_write_batch_size {
            return true;
        }

        false
    }

    /// Whether a single clause's encoded length alone exceeds
    /// `max_bson_obj_size`; such a clause can never be sent, regardless
    /// of what else is in the batch.
    pub fn is_too_large(&self, len: u32) -> bool {
        len > self.max_bson_obj_size
    }

    pub fn max_bson_obj_size(&self) -> u32 {
        self.max_bson_obj_size
    }

    /// Builds the `TooLarge` error for a clause that failed
    /// `is_too_large`.
    pub fn too_large_error(&self, index: i32, len: u32) -> Error {
        Error::TooLarge {
            index: index,
            len: len as i32,
            max: self.max_bson_obj_size as i32,
        }
    }

    /// Legacy insert path: whether the next document would overflow the
    /// current I/O-vector batch. When `allow_bulk_op_insert` is false,
    /// every batch is exactly one document; otherwise the batch is
    /// capped by `max_msg_size`, which bounds the whole OP_INSERT
    /// message rather than just the document payload.
    pub fn legacy_insert_would_overflow(&self,
                                         accumulated: u32,
                                         candidate_len: u32,
                                         allow_bulk_op_insert: bool,
                                         docs_in_batch: u32)
                                         -> bool {
        if !allow_bulk_op_insert {
            return docs_in_batch >= 1;
        }

        accumulated + candidate_len > self.max_msg_size
    }

    pub fn check_not_too_large(&self, index: i32, len: u32) -> Result<()> {
        if self.is_too_large(len) {
            return Err(self.too_large_error(index, len));
        }
        Ok(())
    }
}
