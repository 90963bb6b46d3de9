//! Bitflags for the legacy opcodes this core emits.
//!
//! Kept as plain `bitflags!`-style constants rather than pulling in the
//! `bitflags` crate, matching how small this set is and how the rest of
//! the wire protocol module represents wire-level integers.

/// Flags for `OP_INSERT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInsertFlags {
    bits: i32,
}

impl OpInsertFlags {
    pub const CONTINUE_ON_ERROR: i32 = 1 << 0;

    pub fn none() -> OpInsertFlags {
        OpInsertFlags { bits: 0 }
    }

    pub fn with_continue_on_error(ordered: bool) -> OpInsertFlags {
        if ordered {
            OpInsertFlags::none()
        } else {
            OpInsertFlags { bits: OpInsertFlags::CONTINUE_ON_ERROR }
        }
    }

    pub fn bits(&self) -> i32 {
        self.bits
    }
}

/// Flags for `OP_UPDATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpUpdateFlags {
    bits: i32,
}

impl OpUpdateFlags {
    pub const UPSERT: i32 = 1 << 0;
    pub const MULTI_UPDATE: i32 = 1 << 1;

    pub fn new(upsert: bool, multi: bool) -> OpUpdateFlags {
        let mut bits = 0;
        if upsert {
            bits |= OpUpdateFlags::UPSERT;
        }
        if multi {
            bits |= OpUpdateFlags::MULTI_UPDATE;
        }
        OpUpdateFlags { bits: bits }
    }

    pub fn bits(&self) -> i32 {
        self.bits
    }
}

/// Flags for `OP_DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDeleteFlags {
    bits: i32,
}

impl OpDeleteFlags {
    pub const SINGLE_REMOVE: i32 = 1 << 0;

    pub fn new(multi: bool) -> OpDeleteFlags {
        if multi {
            OpDeleteFlags { bits: 0 }
        } else {
            OpDeleteFlags { bits: OpDeleteFlags::SINGLE_REMOVE }
        }
    }

    pub fn bits(&self) -> i32 {
        self.bits
    }
}

/// Flags for the `OP_QUERY` issued to run `getLastError`. A getLastError
/// query always targets exactly one server and wants exactly one reply
/// document, so this carries no configurable bits today, but is kept as a
/// distinct type so a future tailing-cursor caller (out of scope here)
/// doesn't confuse the two opcodes' flag spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpQueryFlags {
    bits: i32,
}

impl OpQueryFlags {
    pub fn none() -> OpQueryFlags {
        OpQueryFlags { bits: 0 }
    }

    pub fn bits(&self) -> i32 {
        self.bits
    }
}
