//! Write concern: how strongly the caller wants the server to confirm a
//! write before the driver reports success.

use bson::{Bson, Document};

use error::{Error, Result};

/// The `w` portion of a write concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    /// `w` omitted: acknowledged, equivalent to `Acknowledged`.
    Default,
    /// `w: 0`.
    Unacknowledged,
    /// `w: 1`.
    Acknowledged,
    /// `w: "majority"`.
    Majority,
    /// `w: <tag set name>`.
    Tag(String),
    /// `w: <n>` for n > 1.
    Custom(i32),
}

/// A write concern: `w`, `j`, `fsync`, and `wtimeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConcern {
    pub w: Level,
    pub j: Option<bool>,
    pub fsync: Option<bool>,
    pub w_timeout: Option<i64>,
}

impl WriteConcern {
    /// The implicit default: acknowledged, no journal or fsync requirement.
    pub fn new() -> WriteConcern {
        WriteConcern {
            w: Level::Default,
            j: None,
            fsync: None,
            w_timeout: None,
        }
    }

    /// `w: 0`, fire-and-forget.
    pub fn unacknowledged() -> WriteConcern {
        WriteConcern {
            w: Level::Unacknowledged,
            j: None,
            fsync: None,
            w_timeout: None,
        }
    }

    /// Whether this write concern requires the server (command path) or a
    /// getLastError round-trip (legacy path) to confirm the write.
    ///
    /// False only for `w: 0` with no `j`/`fsync` requirement layered on top
    /// -- a caller can ask for `w: 0, j: true`, which still needs a
    /// round-trip to observe the journal commit.
    pub fn needs_gle(&self) -> bool {
        if self.j == Some(true) || self.fsync == Some(true) {
            return true;
        }

        self.w != Level::Unacknowledged
    }

    /// `w: 0` combined with a durability requirement makes no sense: there
    /// would be no reply to read the durability confirmation from.
    pub fn is_valid(&self) -> Result<()> {
        if self.w == Level::Unacknowledged && (self.j == Some(true) || self.fsync == Some(true)) {
            return Err(Error::InvalidArgument(
                "cannot request an unacknowledged write (w: 0) together with j or fsync"
                    .to_owned(),
            ));
        }

        Ok(())
    }

    /// The wire representation used for the `writeConcern` field of a
    /// command. Callers needing the "this write is unacknowledged" empty
    /// sentinel should not call this directly -- see
    /// `CommandExecutor::write_concern_document`.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();

        match self.w {
            Level::Default | Level::Acknowledged => {
                doc.insert("w".to_owned(), Bson::I32(1));
            }
            Level::Unacknowledged => {
                doc.insert("w".to_owned(), Bson::I32(0));
            }
            Level::Majority => {
                doc.insert("w".to_owned(), Bson::String("majority".to_owned()));
            }
            Level::Tag(ref tag) => {
                doc.insert("w".to_owned(), Bson::String(tag.clone()));
            }
            Level::Custom(n) => {
                doc.insert("w".to_owned(), Bson::I32(n));
            }
        }

        if let Some(j) = self.j {
            doc.insert("j".to_owned(), Bson::Boolean(j));
        }
        if let Some(fsync) = self.fsync {
            doc.insert("fsync".to_owned(), Bson::Boolean(fsync));
        }
        if let Some(timeout) = self.w_timeout {
            doc.insert("wtimeout".to_owned(), Bson::I64(timeout));
        }

        doc
    }
}

impl Default for WriteConcern {
    fn default() -> WriteConcern {
        WriteConcern::new()
    }
}
