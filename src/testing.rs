//! In-memory `Transport` fake used by this crate's own tests and
//! available to downstream integration tests that want to exercise the
//! executors without a live `mongod`. No mocking framework: this is a
//! hand-written fake that records what it was asked to send and replays
//! a scripted queue of replies, in the style the rest of this driver's
//! test suites use.

use std::collections::VecDeque;

use bson::Document;

use error::Result;
use server::Hint;
use transport::Transport;

#[derive(Debug, Clone)]
pub struct SentInsert {
    pub namespace: String,
    pub flags: i32,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone)]
pub struct SentUpdate {
    pub namespace: String,
    pub flags: i32,
    pub selector: Document,
    pub update: Document,
}

#[derive(Debug, Clone)]
pub struct SentDelete {
    pub namespace: String,
    pub flags: i32,
    pub selector: Document,
}

/// Records every opcode/command sent through it and answers from a
/// scripted, in-order queue of replies. A queue running dry yields an
/// empty document rather than panicking, so tests for unacknowledged
/// writes don't need to push a reply that will never be read.
pub struct StubTransport {
    pub sent_commands: Vec<Document>,
    pub sent_inserts: Vec<SentInsert>,
    pub sent_updates: Vec<SentUpdate>,
    pub sent_deletes: Vec<SentDelete>,
    command_replies: VecDeque<Document>,
    legacy_replies: VecDeque<Document>,
}

impl StubTransport {
    pub fn new() -> StubTransport {
        StubTransport {
            sent_commands: Vec::new(),
            sent_inserts: Vec::new(),
            sent_updates: Vec::new(),
            sent_deletes: Vec::new(),
            command_replies: VecDeque::new(),
            legacy_replies: VecDeque::new(),
        }
    }

    pub fn push_command_reply(&mut self, reply: Document) {
        self.command_replies.push_back(reply);
    }

    pub fn push_legacy_reply(&mut self, reply: Document) {
        self.legacy_replies.push_back(reply);
    }
}

impl Default for StubTransport {
    fn default() -> StubTransport {
        StubTransport::new()
    }
}

impl Transport for StubTransport {
    fn send_insert(&mut self,
                    _hint: Hint,
                    namespace: &str,
                    flags: i32,
                    documents: &[&Document],
                    with_reply: bool,
                    _gle_database: &str)
                    -> Result<Option<Document>> {
        self.sent_inserts.push(SentInsert {
            namespace: namespace.to_owned(),
            flags: flags,
            documents: documents.iter().map(|d| (*d).clone()).collect(),
        });

        if with_reply {
            Ok(Some(self.legacy_replies.pop_front().unwrap_or_else(Document::new)))
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
                    _gle_database: &str)
                    -> Result<Option<Document>> {
        self.sent_updates.push(SentUpdate {
            namespace: namespace.to_owned(),
            flags: flags,
            selector: selector.clone(),
            update: update.clone(),
        });

        if with_reply {
            Ok(Some(self.legacy_replies.pop_front().unwrap_or_else(Document::new)))
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
                    _gle_database: &str)
                    -> Result<Option<Document>> {
        self.sent_deletes.push(SentDelete {
            namespace: namespace.to_owned(),
            flags: flags,
            selector: selector.clone(),
        });

        if with_reply {
            Ok(Some(self.legacy_replies.pop_front().unwrap_or_else(Document::new)))
        } else {
            Ok(None)
        }
    }

    fn run_command(&mut self, _hint: Hint, _database: &str, command: &Document) -> Result<Document> {
        self.sent_commands.push(command.clone());
        Ok(self.command_replies.pop_front().unwrap_or_else(Document::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    #[test]
    fn records_sent_commands_and_replays_scripted_replies() {
        let mut transport = StubTransport::new();
        let mut reply = Document::new();
        reply.insert("ok".to_owned(), Bson::I32(1));
        transport.push_command_reply(reply.clone());

        let cmd = Document::new();
        let got = transport.run_command(1, "db", &cmd).unwrap();

        assert_eq!(got, reply);
        assert_eq!(transport.sent_commands.len(), 1);
    }

    #[test]
    fn unscripted_queue_yields_empty_document() {
        let mut transport = StubTransport::new();
        let selector = Document::new();
        let got = transport.send_delete(1, "db.coll", 0, &selector, true, "db").unwrap();
        assert_eq!(got, Some(Document::new()));
    }
}
