//! Drives one `WriteCommand` over the command protocol: `{insert|update|
//! delete: collection, writeConcern, ordered, documents|updates|deletes:
//! [...]}` sent batch by batch against `<database>.$cmd`.

use bson::{Bson, Document};

use batch::{BatchPlanner, CLAUSE_KEY_OVERHEAD};
use concern::WriteConcern;
use encoder::clause_at;
use error::Result;
use server::{Hint, ServerDescription};
use transport::Transport;
use write_command::WriteCommand;
use write_result::WriteResult;

struct BatchPlan {
    start: u32,
    count: u32,
    has_more: bool,
    stopped_on_too_large: bool,
}

/// Plans the next batch starting at `cursor`. When a too-large clause is
/// the first candidate considered, this records the error on `result`
/// and either stops everything (ordered) or skips the clause and
/// retries planning from the next one (unordered).
fn plan_next_batch(command: &WriteCommand, mut cursor: u32, planner: &BatchPlanner, offset: u32, result: &mut WriteResult) -> Result<BatchPlan> {
    loop {
        if cursor >= command.n_documents {
            return Ok(BatchPlan { start: cursor, count: 0, has_more: false, stopped_on_too_large: false });
        }

        let start = cursor;
        let mut accumulated = 0u32;
        let mut count = 0u32;
        let mut has_more = false;
        let mut retry_from = None;

        let mut i = start;
        while i < command.n_documents {
            let len = match clause_at(&command.payload, i) {
                Some(doc) => try!(::encoder::encoded_len(doc)),
                None => break,
            };

            if planner.is_too_large(len) {
                if count > 0 {
                    has_more = true;
                    break;
                }

                warn!("clause {} is too large ({} bytes, max {})", i, len, planner.max_bson_obj_size());
                result.fail_too_large((offset + i) as i32, len as i32, planner.max_bson_obj_size() as i32);

                if command.ordered {
                    return Ok(BatchPlan { start: start, count: 0, has_more: false, stopped_on_too_large: true });
                }

                retry_from = Some(i + 1);
                break;
            }

            let with_overhead = len + CLAUSE_KEY_OVERHEAD;
            if count > 0 && planner.would_overflow(accumulated, with_overhead, count) {
                has_more = true;
                break;
            }

            accumulated += with_overhead;
            count += 1;
            i += 1;
        }

        if let Some(next) = retry_from {
            cursor = next;
            continue;
        }

        return Ok(BatchPlan {
            start: start,
            count: count,
            has_more: has_more || (start + count) < command.n_documents,
            stopped_on_too_large: false,
        });
    }
}

fn build_batch_array(command: &WriteCommand, start: u32, count: u32) -> Bson {
    let mut items = Vec::with_capacity(count as usize);
    for i in start..(start + count) {
        if let Some(doc) = clause_at(&command.payload, i) {
            items.push(Bson::Document(doc.clone()));
        }
    }
    Bson::Array(items)
}

fn build_command_document(command: &WriteCommand, collection: &str, write_concern_doc: Document, batch: Bson) -> Document {
    let mut doc = Document::new();
    doc.insert(command.kind.op_name().to_owned(), Bson::String(collection.to_owned()));
    doc.insert("writeConcern".to_owned(), Bson::Document(write_concern_doc));
    doc.insert("ordered".to_owned(), Bson::Boolean(command.ordered));
    doc.insert(command.kind.op_field().to_owned(), batch);
    doc
}

/// Runs `command` to completion over the command protocol, merging every
/// batch's reply into `result`. `offset` biases per-index fields so they
/// stay meaningful to a caller tracking clauses across several commands.
pub fn execute<T: Transport>(transport: &mut T,
                              server: &ServerDescription,
                              command: &WriteCommand,
                              database: &str,
                              collection: &str,
                              write_concern: &WriteConcern,
                              hint: Hint,
                              mut offset: u32)
                              -> Result<WriteResult> {
    let planner = BatchPlanner::new(server);
    let mut result = WriteResult::new();

    let with_reply = write_concern.needs_gle();
    let write_concern_doc = if with_reply { write_concern.to_document() } else { Document::new() };

    let mut cursor = 0u32;

    loop {
        if cursor >= command.n_documents {
            break;
        }

        let plan = try!(plan_next_batch(command, cursor, &planner, offset, &mut result));
        if plan.stopped_on_too_large {
            return Ok(result);
        }

        if plan.count == 0 {
            break;
        }

        let batch_array = build_batch_array(command, plan.start, plan.count);
        trace!("sending {} clauses (offset {}) to {}.{}", plan.count, offset, database, collection);

        let doc = build_command_document(command, collection, write_concern_doc.clone(), batch_array);

        let batch_ok = match transport.run_command(hint, database, &doc) {
            Ok(reply) => {
                result.merge(command, &reply, offset);
                true
            }
            Err(err) => {
                error!("command batch failed: {}", err);
                result.fail(err);
                false
            }
        };

        offset += plan.count;
        cursor = plan.start + plan.count;

        if !plan.has_more {
            break;
        }
        if !(batch_ok || !command.ordered) {
            break;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concern::WriteConcern;
    use testing::StubTransport;
    use write_command::WriteCommand;

    fn doc_field(doc: &Document) -> i32 {
        match doc.get("x") {
            Some(&Bson::I32(n)) => n,
            _ => -1,
        }
    }

    #[test]
    fn single_batch_insert_merges_into_inserted_count() {
        let mut a = Document::new();
        a.insert("x".to_owned(), Bson::I32(1));
        let mut b = Document::new();
        b.insert("x".to_owned(), Bson::I32(2));

        let command = WriteCommand::init_insert(&[a, b], true, true);

        let mut reply = Document::new();
        reply.insert("ok".to_owned(), Bson::I32(1));
        reply.insert("n".to_owned(), Bson::I32(2));

        let mut transport = StubTransport::new();
        transport.push_command_reply(reply);

        let server = ServerDescription::modern();
        let result = execute(&mut transport,
                              &server,
                              &command,
                              "db",
                              "coll",
                              &WriteConcern::new(),
                              1,
                              0)
            .unwrap();

        assert_eq!(result.n_inserted, 2);
        assert_eq!(transport.sent_commands.len(), 1);
        let sent = &transport.sent_commands[0];
        assert_eq!(sent.get("insert"), Some(&Bson::String("coll".to_owned())));

        if let Some(&Bson::Array(ref docs)) = sent.get("documents") {
            assert_eq!(docs.len(), 2);
            if let Bson::Document(ref d) = docs[0] {
                assert_eq!(doc_field(d), 1);
            }
        } else {
            panic!("expected a documents array");
        }
    }

    #[test]
    fn unordered_continues_past_batch_with_write_errors() {
        let selector = Document::new();
        let update = Document::new();
        let mut command = WriteCommand::init_update(selector.clone(), update.clone(), false, false, false);
        command.append_update(selector, update, false, false);

        let mut reply1 = Document::new();
        reply1.insert("ok".to_owned(), Bson::I32(1));
        reply1.insert("n".to_owned(), Bson::I32(0));
        let mut error_entry = Document::new();
        error_entry.insert("index".to_owned(), Bson::I32(0));
        error_entry.insert("code".to_owned(), Bson::I32(11000));
        error_entry.insert("errmsg".to_owned(), Bson::String("dup".to_owned()));
        reply1.insert("writeErrors".to_owned(), Bson::Array(vec![Bson::Document(error_entry)]));

        let mut transport = StubTransport::new();
        transport.push_command_reply(reply1);

        let server = ServerDescription {
            min_wire_version: 0,
            max_wire_version: 6,
            max_bson_obj_size: 16 * 1024 * 1024,
            max_write_batch_size: 1, // forces two batches
            max_msg_size: 48 * 1024 * 1024,
        };

        let mut reply2 = Document::new();
        reply2.insert("ok".to_owned(), Bson::I32(1));
        reply2.insert("n".to_owned(), Bson::I32(1));
        reply2.insert("nModified".to_owned(), Bson::I32(1));
        transport.push_command_reply(reply2);

        let result = execute(&mut transport,
                              &server,
                              &command,
                              "db",
                              "coll",
                              &WriteConcern::new(),
                              1,
                              0)
            .unwrap();

        assert_eq!(transport.sent_commands.len(), 2);
        assert_eq!(result.n_matched, 1);
        assert!(result.failed);
    }
}
