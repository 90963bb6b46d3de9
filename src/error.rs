use std::error;
use std::fmt;
use std::io;

use bson::{DecoderError, EncoderError};

/// Result type used throughout the write-command core.
pub type Result<T> = ::std::result::Result<T, Error>;

/// The error taxonomy for the write-command core.
///
/// `TooLarge`, `ServerWriteError`, and `ServerWriteConcernError` carry the
/// fields needed to synthesize a `writeErrors`/`writeConcernError` entry;
/// the others are opaque messages, matching how the source reports
/// `bson_error_t` domains.
#[derive(Debug, Clone)]
pub enum Error {
    /// The write concern was invalid, or a command had zero documents.
    InvalidArgument(String),
    /// An update document failed strict key validation, or a clause was
    /// malformed (missing `q` or `u`).
    BsonInvalid(String),
    /// A single clause exceeded `max_bson_obj_size`.
    TooLarge { index: i32, len: i32, max: i32 },
    /// The RPC transport failed to send or receive.
    Transport(String),
    /// The server rejected one clause within an otherwise successful batch.
    ServerWriteError { index: i32, code: i32, message: String },
    /// The server accepted the write but could not satisfy the write concern.
    ServerWriteConcernError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidArgument(ref msg) => write!(f, "invalid argument: {}", msg),
            Error::BsonInvalid(ref msg) => write!(f, "invalid bson: {}", msg),
            Error::TooLarge { index, len, max } => {
                write!(f,
                       "document {} is too large for the cluster. document is {} bytes, max is {}.",
                       index, len, max)
            }
            Error::Transport(ref msg) => write!(f, "transport error: {}", msg),
            Error::ServerWriteError { index, code, ref message } => {
                write!(f, "write error at index {} (code {}): {}", index, code, message)
            }
            Error::ServerWriteConcernError(ref msg) => {
                write!(f, "write concern error: {}", msg)
            }
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::InvalidArgument(ref msg) => msg,
            Error::BsonInvalid(ref msg) => msg,
            Error::TooLarge { .. } => "document too large for cluster",
            Error::Transport(ref msg) => msg,
            Error::ServerWriteError { ref message, .. } => message,
            Error::ServerWriteConcernError(ref msg) => msg,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Transport(err.to_string())
    }
}

impl From<EncoderError> for Error {
    fn from(err: EncoderError) -> Error {
        Error::BsonInvalid(err.to_string())
    }
}

impl From<DecoderError> for Error {
    fn from(err: DecoderError) -> Error {
        Error::BsonInvalid(err.to_string())
    }
}

/// Code used for `too-large` clauses, matching the code MongoDB 2.6 uses
/// for its own "too large" responses.
pub const TOO_LARGE_CODE: i32 = 2;
