//! Folds per-batch server replies into one final result.

use bson::{Bson, Document};

use encoder;
use error::{self, Error};
use write_command::{Kind, WriteCommand};

fn get_i32(doc: &Document, key: &str) -> Option<i32> {
    match doc.get(key) {
        Some(&Bson::I32(n)) => Some(n),
        Some(&Bson::I64(n)) => Some(n as i32),
        _ => None,
    }
}

fn get_bool(doc: &Document, key: &str) -> Option<bool> {
    match doc.get(key) {
        Some(&Bson::Boolean(b)) => Some(b),
        _ => None,
    }
}

/// Accumulates the effect of one or more batch replies for a single
/// `WriteCommand` (or, via the dispatcher, several commands issued back
/// to back with increasing `offset`s) into one final result.
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub n_inserted: u32,
    pub n_matched: u32,
    pub n_modified: u32,
    pub n_removed: u32,
    pub n_upserted: u32,
    pub omit_n_modified: bool,
    pub upserted: Document,
    pub upsert_append_count: u32,
    pub write_errors: Document,
    pub write_concern_error: Document,
    pub failed: bool,
    pub error: Option<Error>,
}

impl WriteResult {
    pub fn new() -> WriteResult {
        WriteResult {
            n_inserted: 0,
            n_matched: 0,
            n_modified: 0,
            n_removed: 0,
            n_upserted: 0,
            omit_n_modified: false,
            upserted: Document::new(),
            upsert_append_count: 0,
            write_errors: Document::new(),
            write_concern_error: Document::new(),
            failed: false,
            error: None,
        }
    }

    fn append_upsert(&mut self, index: i32, id: Bson) {
        let mut doc = Document::new();
        doc.insert("index".to_owned(), Bson::I32(index));
        doc.insert("_id".to_owned(), id);
        encoder::append_indexed(&mut self.upserted, self.upsert_append_count, Bson::Document(doc));
        self.upsert_append_count += 1;
    }

    fn append_write_error(&mut self, index: i32, code: i32, errmsg: String) {
        let mut doc = Document::new();
        doc.insert("index".to_owned(), Bson::I32(index));
        doc.insert("code".to_owned(), Bson::I32(code));
        doc.insert("errmsg".to_owned(), Bson::String(errmsg));

        let key = self.write_errors.len() as u32;
        encoder::append_indexed(&mut self.write_errors, key, Bson::Document(doc));
    }

    fn merge_write_errors_array(&mut self, errors: &[Bson], offset: u32) {
        for item in errors {
            if let Bson::Document(ref d) = *item {
                let idx = get_i32(d, "index").unwrap_or(0) + offset as i32;
                let code = get_i32(d, "code").unwrap_or(0);
                let errmsg = match d.get("errmsg") {
                    Some(&Bson::String(ref s)) => s.clone(),
                    _ => String::new(),
                };
                self.append_write_error(idx, code, errmsg);
            }
        }
    }

    /// Merges one command-protocol reply (an `insert`/`update`/`delete`
    /// command's response document).
    pub fn merge(&mut self, command: &WriteCommand, reply: &Document, offset: u32) {
        let has_write_errors = match reply.get("writeErrors") {
            Some(&Bson::Array(ref arr)) => !arr.is_empty(),
            _ => false,
        };
        if has_write_errors {
            self.failed = true;
        }

        let affected = get_i32(reply, "n").unwrap_or(0).max(0);

        match command.kind {
            Kind::Insert { .. } => self.n_inserted += affected as u32,
            Kind::Delete { .. } => self.n_removed += affected as u32,
            Kind::Update => {
                match reply.get("upserted") {
                    Some(&Bson::Array(ref arr)) => {
                        let mut n_upserted_in_batch: i32 = 0;
                        for item in arr {
                            if let Bson::Document(ref d) = *item {
                                let idx = get_i32(d, "index").unwrap_or(0);
                                if let Some(id_value) = d.get("_id") {
                                    self.append_upsert(offset as i32 + idx, id_value.clone());
                                    n_upserted_in_batch += 1;
                                }
                            }
                        }
                        self.n_upserted += n_upserted_in_batch as u32;
                        let matched = affected - n_upserted_in_batch;
                        self.n_matched += if matched > 0 { matched as u32 } else { 0 };
                    }
                    _ => {
                        self.n_matched += affected as u32;
                    }
                }

                match reply.get("nModified") {
                    Some(&Bson::I32(n)) => self.n_modified += n.max(0) as u32,
                    Some(&Bson::I64(n)) => self.n_modified += n.max(0) as u32,
                    _ => self.omit_n_modified = true,
                }
            }
        }

        if let Some(&Bson::Array(ref arr)) = reply.get("writeErrors") {
            self.merge_write_errors_array(arr, offset);
        }

        if let Some(&Bson::Document(ref wce)) = reply.get("writeConcernError") {
            for (k, v) in wce.iter() {
                self.write_concern_error.insert(k.clone(), v.clone());
            }
        }
    }

    /// Merges one legacy getLastError reply, normalizing its smaller
    /// shape into the same counters the command path produces (minus
    /// `nModified`, which legacy servers never report).
    pub fn merge_legacy(&mut self, command: &WriteCommand, reply: &Document, offset: u32) {
        let n = get_i32(reply, "n").unwrap_or(0).max(0);
        let err = match reply.get("err") {
            Some(&Bson::String(ref s)) => Some(s.clone()),
            _ => None,
        };
        let code = get_i32(reply, "code");

        if let (Some(code), Some(err)) = (code, err) {
            self.failed = true;
            self.error = Some(Error::ServerWriteError {
                index: offset as i32,
                code: code,
                message: err.clone(),
            });
            self.append_write_error(offset as i32, code, err);
        }

        match command.kind {
            Kind::Insert { .. } => self.n_inserted += n as u32,
            Kind::Delete { .. } => self.n_removed += n as u32,
            Kind::Update => {
                match reply.get("upserted") {
                    Some(&Bson::Array(ref arr)) => {
                        self.n_upserted += n as u32;
                        for (i, item) in arr.iter().enumerate() {
                            if let Bson::Document(ref d) = *item {
                                if let Some(id_value) = d.get("_id") {
                                    self.append_upsert(offset as i32 + i as i32, id_value.clone());
                                }
                            }
                        }
                    }
                    Some(value) => {
                        self.n_upserted += n as u32;
                        self.append_upsert(offset as i32, value.clone());
                    }
                    None => {
                        let updated_existing = get_bool(reply, "updatedExisting");
                        if n == 1 && updated_existing == Some(false) {
                            self.n_upserted += n as u32;
                        } else {
                            self.n_matched += n as u32;
                        }
                    }
                }
            }
        }

        self.omit_n_modified = true;
    }

    /// Finalizes the result. Returns whether the overall command
    /// succeeded; if `out` is given, fills it with the canonical result
    /// document described in the external interfaces section.
    pub fn complete(&mut self, out: Option<&mut Document>) -> bool {
        let ok = !self.failed && self.write_concern_error.is_empty() && self.write_errors.is_empty();

        if let Some(doc) = out {
            doc.insert("nInserted".to_owned(), Bson::I32(self.n_inserted as i32));
            doc.insert("nMatched".to_owned(), Bson::I32(self.n_matched as i32));
            if !self.omit_n_modified {
                doc.insert("nModified".to_owned(), Bson::I32(self.n_modified as i32));
            }
            doc.insert("nRemoved".to_owned(), Bson::I32(self.n_removed as i32));
            doc.insert("nUpserted".to_owned(), Bson::I32(self.n_upserted as i32));

            if !self.upserted.is_empty() {
                let items: Vec<Bson> = encoder::iter_indexed(&self.upserted).into_iter().cloned().collect();
                doc.insert("upserted".to_owned(), Bson::Array(items));
            }

            let errors: Vec<Bson> = encoder::iter_indexed(&self.write_errors).into_iter().cloned().collect();
            doc.insert("writeErrors".to_owned(), Bson::Array(errors));

            if !self.write_concern_error.is_empty() {
                doc.insert("writeConcernError".to_owned(), Bson::Document(self.write_concern_error.clone()));
            }
        }

        if !ok && self.error.is_none() {
            if let Some(&Bson::Document(ref first)) = encoder::iter_indexed(&self.write_errors).first().cloned() {
                let index = get_i32(first, "index").unwrap_or(0);
                let code = get_i32(first, "code").unwrap_or(0);
                let errmsg = match first.get("errmsg") {
                    Some(&Bson::String(ref s)) => s.clone(),
                    _ => String::new(),
                };
                self.error = Some(Error::ServerWriteError {
                    index: index,
                    code: code,
                    message: errmsg,
                });
            }
        }

        ok
    }

    /// Records a local failure (too-large clause, invalid argument,
    /// transport error) that short-circuited execution before any reply
    /// could be merged.
    pub fn fail(&mut self, err: Error) {
        self.failed = true;
        self.error = Some(err);
    }

    /// Records a too-large clause as a synthesized write error, matching
    /// the shape a server-reported error would take.
    pub fn fail_too_large(&mut self, index: i32, len: i32, max: i32) {
        self.failed = true;
        let message = format!("document {} is too large for the cluster. document is {} bytes, max is {}.",
                               index, len, max);
        self.error = Some(Error::TooLarge { index: index, len: len, max: max });
        self.append_write_error(index, error::TOO_LARGE_CODE, message);
    }
}

impl Default for WriteResult {
    fn default() -> WriteResult {
        WriteResult::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use write_command::WriteCommand;

    #[test]
    fn merge_insert_counts_n_as_inserted() {
        let command = WriteCommand::init_insert(&[Document::new(), Document::new()], true, true);
        let mut reply = Document::new();
        reply.insert("n".to_owned(), Bson::I32(2));
        reply.insert("ok".to_owned(), Bson::I32(1));

        let mut result = WriteResult::new();
        result.merge(&command, &reply, 0);

        assert_eq!(result.n_inserted, 2);
        assert!(!result.failed);
    }

    #[test]
    fn merge_update_upsert_array_sets_upserted_and_matched() {
        let command = WriteCommand::init_update(Document::new(), Document::new(), true, false, true);

        let mut upsert_entry = Document::new();
        upsert_entry.insert("index".to_owned(), Bson::I32(0));
        upsert_entry.insert("_id".to_owned(), Bson::String("abc".to_owned()));

        let mut reply = Document::new();
        reply.insert("n".to_owned(), Bson::I32(1));
        reply.insert("nModified".to_owned(), Bson::I32(0));
        reply.insert("upserted".to_owned(), Bson::Array(vec![Bson::Document(upsert_entry)]));

        let mut result = WriteResult::new();
        result.merge(&command, &reply, 0);

        assert_eq!(result.n_upserted, 1);
        assert_eq!(result.n_matched, 0);
        assert_eq!(result.n_modified, 0);
        assert!(!result.omit_n_modified);
    }

    #[test]
    fn merge_missing_n_modified_sets_omit_sticky() {
        let command = WriteCommand::init_update(Document::new(), Document::new(), false, false, true);

        let mut reply_a = Document::new();
        reply_a.insert("n".to_owned(), Bson::I32(1));
        reply_a.insert("nModified".to_owned(), Bson::I32(1));

        let mut reply_b = Document::new();
        reply_b.insert("n".to_owned(), Bson::I32(1));
        // no nModified -- simulates a shard that hasn't upgraded

        let mut result = WriteResult::new();
        result.merge(&command, &reply_a, 0);
        assert!(!result.omit_n_modified);
        result.merge(&command, &reply_b, 1);
        assert!(result.omit_n_modified);
    }

    #[test]
    fn complete_backfills_error_from_first_write_error() {
        let command = WriteCommand::init_update(Document::new(), Document::new(), false, false, true);

        let mut error_entry = Document::new();
        error_entry.insert("index".to_owned(), Bson::I32(1));
        error_entry.insert("code".to_owned(), Bson::I32(11000));
        error_entry.insert("errmsg".to_owned(), Bson::String("dup".to_owned()));

        let mut reply = Document::new();
        reply.insert("n".to_owned(), Bson::I32(1));
        reply.insert("nModified".to_owned(), Bson::I32(1));
        reply.insert("writeErrors".to_owned(), Bson::Array(vec![Bson::Document(error_entry)]));

        let mut result = WriteResult::new();
        result.merge(&command, &reply, 0);

        let ok = result.complete(None);
        assert!(!ok);
        match result.error {
            Some(Error::ServerWriteError { index, code, ref message }) => {
                assert_eq!(index, 1);
                assert_eq!(code, 11000);
                assert_eq!(message, "dup");
            }
            ref other => panic!("expected a ServerWriteError, got {:?}", other),
        }
    }

    #[test]
    fn merge_legacy_infers_upsert_when_not_updated_existing() {
        let command = WriteCommand::init_update(Document::new(), Document::new(), true, false, true);

        let mut reply = Document::new();
        reply.insert("n".to_owned(), Bson::I32(1));
        reply.insert("updatedExisting".to_owned(), Bson::Boolean(false));

        let mut result = WriteResult::new();
        result.merge_legacy(&command, &reply, 0);

        assert_eq!(result.n_upserted, 1);
        assert_eq!(result.n_matched, 0);
        assert!(result.omit_n_modified);
    }
}
