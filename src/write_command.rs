//! The in-memory representation of one pending write operation.

use bson::{Bson, Document};

use encoder;
use oid::ObjectId;
use server::Hint;

/// Which server-side operation a `WriteCommand` will perform. Carries the
/// per-kind configuration that the legacy executor needs and the command
/// executor reads when naming its `opname`/`opfield`.
#[derive(Debug, Clone)]
pub enum Kind {
    Insert { allow_bulk_op_insert: bool },
    Update,
    Delete { multi: bool },
}

impl Kind {
    /// The command name used as the command document's first field
    /// (`insert`/`update`/`delete`).
    pub fn op_name(&self) -> &'static str {
        match *self {
            Kind::Insert { .. } => "insert",
            Kind::Update => "update",
            Kind::Delete { .. } => "delete",
        }
    }

    /// The array field name carrying the clauses (`documents`/`updates`/
    /// `deletes`).
    pub fn op_field(&self) -> &'static str {
        match *self {
            Kind::Insert { .. } => "documents",
            Kind::Update => "updates",
            Kind::Delete { .. } => "deletes",
        }
    }

    /// The message used when a command of this kind has zero clauses.
    pub fn empty_error_message(&self) -> String {
        format!("cannot do an empty {}", self.op_name())
    }
}

/// One pending insert, update, or delete, plus its accumulated clauses.
///
/// `payload` stores clauses under stringified, contiguous, zero-based
/// keys (`"0"`, `"1"`, ...) rather than in a `Bson::Array`, so that
/// batches can be sliced out of it without re-indexing -- the same
/// append-only-array-as-document trick the source uses with a raw
/// `bson_t`.
#[derive(Debug, Clone)]
pub struct WriteCommand {
    pub kind: Kind,
    pub ordered: bool,
    pub payload: Document,
    pub n_documents: u32,
    pub server_hint: Hint,
}

impl WriteCommand {
    /// Starts a new insert command. Each element of `docs` lacking a
    /// top-level `_id` has one synthesized and prepended.
    pub fn init_insert(docs: &[Document], ordered: bool, allow_bulk_op_insert: bool) -> WriteCommand {
        let mut command = WriteCommand {
            kind: Kind::Insert { allow_bulk_op_insert: allow_bulk_op_insert },
            ordered: ordered,
            payload: Document::new(),
            n_documents: 0,
            server_hint: 0,
        };

        if !docs.is_empty() {
            command.append_insert(docs);
        }

        command
    }

    /// Starts a new update command with one clause.
    pub fn init_update(selector: Document, update: Document, upsert: bool, multi: bool, ordered: bool) -> WriteCommand {
        let mut command = WriteCommand {
            kind: Kind::Update,
            ordered: ordered,
            payload: Document::new(),
            n_documents: 0,
            server_hint: 0,
        };

        command.append_update(selector, update, upsert, multi);
        command
    }

    /// Starts a new delete command with one clause.
    pub fn init_delete(selector: Document, multi: bool, ordered: bool) -> WriteCommand {
        let mut command = WriteCommand {
            kind: Kind::Delete { multi: multi },
            ordered: ordered,
            payload: Document::new(),
            n_documents: 0,
            server_hint: 0,
        };

        command.append_delete(selector);
        command
    }

    /// Appends more documents to an insert command, synthesizing `_id`
    /// where it's missing.
    pub fn append_insert(&mut self, docs: &[Document]) {
        match self.kind {
            Kind::Insert { .. } => (),
            _ => panic!("append_insert called on a non-insert command"),
        }

        for doc in docs {
            let clause = if encoder::has_id(doc) {
                doc.clone()
            } else {
                prepend_id(doc)
            };

            encoder::append_indexed(&mut self.payload, self.n_documents, Bson::Document(clause));
            self.n_documents += 1;
        }
    }

    /// Appends one more clause to an update command.
    pub fn append_update(&mut self, selector: Document, update: Document, upsert: bool, multi: bool) {
        match self.kind {
            Kind::Update => (),
            _ => panic!("append_update called on a non-update command"),
        }

        let mut clause = Document::new();
        clause.insert("q".to_owned(), Bson::Document(selector));
        clause.insert("u".to_owned(), Bson::Document(update));
        clause.insert("upsert".to_owned(), Bson::Boolean(upsert));
        clause.insert("multi".to_owned(), Bson::Boolean(multi));

        encoder::append_indexed(&mut self.payload, self.n_documents, Bson::Document(clause));
        self.n_documents += 1;
    }

    /// Appends one more clause to a delete command. `limit` is derived
    /// from the command's `multi` flag: `0` for "all matching", `1` for
    /// "one".
    pub fn append_delete(&mut self, selector: Document) {
        let multi = match self.kind {
            Kind::Delete { multi } => multi,
            _ => panic!("append_delete called on a non-delete command"),
        };

        let mut clause = Document::new();
        clause.insert("q".to_owned(), Bson::Document(selector));
        clause.insert("limit".to_owned(), Bson::I32(if multi { 0 } else { 1 }));

        encoder::append_indexed(&mut self.payload, self.n_documents, Bson::Document(clause));
        self.n_documents += 1;
    }
}

fn prepend_id(doc: &Document) -> Document {
    let id = ObjectId::new().expect("failed to generate an object id");

    let mut clause = Document::new();
    clause.insert("_id".to_owned(), id.to_bson());
    for (key, value) in doc.iter() {
        clause.insert(key.clone(), value.clone());
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;

    fn doc_at(command: &WriteCommand, index: u32) -> Document {
        match command.payload.get(&index.to_string()) {
            Some(&Bson::Document(ref d)) => d.clone(),
            other => panic!("expected a document at index {}, got {:?}", index, other),
        }
    }

    #[test]
    fn insert_synthesizes_missing_id_as_first_field() {
        let mut doc = Document::new();
        doc.insert("x".to_owned(), Bson::I32(1));

        let command = WriteCommand::init_insert(&[doc], true, true);
        let clause = doc_at(&command, 0);

        let mut keys = clause.keys();
        assert_eq!(keys.next().map(|s| s.as_str()), Some("_id"));
        assert_eq!(keys.next().map(|s| s.as_str()), Some("x"));
        assert_eq!(command.n_documents, 1);
    }

    #[test]
    fn insert_preserves_existing_id_verbatim() {
        let mut doc = Document::new();
        doc.insert("_id".to_owned(), Bson::String("k".to_owned()));
        doc.insert("x".to_owned(), Bson::I32(1));

        let command = WriteCommand::init_insert(&[doc.clone()], true, true);
        assert_eq!(doc_at(&command, 0), doc);
    }

    #[test]
    fn delete_limit_follows_multi() {
        let selector = Document::new();
        let single = WriteCommand::init_delete(selector.clone(), false, true);
        let multi = WriteCommand::init_delete(selector, true, true);

        assert_eq!(doc_at(&single, 0).get("limit"), Some(&Bson::I32(1)));
        assert_eq!(doc_at(&multi, 0).get("limit"), Some(&Bson::I32(0)));
    }

    #[test]
    fn payload_keys_are_contiguous() {
        let docs = vec![Document::new(), Document::new(), Document::new()];
        let command = WriteCommand::init_insert(&docs, true, true);

        assert_eq!(command.n_documents, 3);
        for i in 0..3u32 {
            assert!(command.payload.contains_key(&i.to_string()));
        }
    }
}
