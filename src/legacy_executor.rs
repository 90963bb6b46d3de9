//! Drives one `WriteCommand` over the legacy opcodes: `OP_INSERT`,
//! `OP_UPDATE`, `OP_DELETE`, each optionally followed by a getLastError
//! round-trip when the write concern requires acknowledgement.

use bson::{Bson, Document};

use batch::BatchPlanner;
use concern::WriteConcern;
use encoder::{self, clause_at};
use error::{Error, Result};
use server::{Hint, ServerDescription};
use transport::Transport;
use wire_protocol::flags::{OpDeleteFlags, OpInsertFlags, OpUpdateFlags};
use write_command::{Kind, WriteCommand};
use write_result::WriteResult;

fn bool_field(doc: &Document, key: &str) -> Option<bool> {
    match doc.get(key) {
        Some(&Bson::Boolean(b)) => Some(b),
        _ => None,
    }
}

fn int_field(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key) {
        Some(&Bson::I32(n)) => Some(n as i64),
        Some(&Bson::I64(n)) => Some(n),
        _ => None,
    }
}

fn execute_delete<T: Transport>(transport: &mut T,
                                 command: &WriteCommand,
                                 namespace: &str,
                                 hint: Hint,
                                 with_reply: bool,
                                 gle_database: &str,
                                 offset: u32)
                                 -> Result<WriteResult> {
    let mut result = WriteResult::new();

    for i in 0..command.n_documents {
        let clause = clause_at(&command.payload, i).expect("contiguous delete payload");
        let selector = match clause.get("q") {
            Some(&Bson::Document(ref d)) => d.clone(),
            _ => Document::new(),
        };
        let multi = match int_field(clause, "limit") {
            Some(0) => true,
            _ => false,
        };

        let flags = OpDeleteFlags::new(multi).bits();
        match transport.send_delete(hint, namespace, flags, &selector, with_reply, gle_database) {
            Ok(Some(reply)) => result.merge_legacy(command, &reply, offset + i),
            Ok(None) => (),
            Err(err) => {
                error!("legacy delete failed at clause {}: {}", i, err);
                result.fail(err);
                if command.ordered {
                    break;
                }
            }
        }
    }

    Ok(result)
}

fn execute_insert<T: Transport>(transport: &mut T,
                                 planner: &BatchPlanner,
                                 command: &WriteCommand,
                                 namespace: &str,
                                 hint: Hint,
                                 allow_bulk_op_insert: bool,
                                 with_reply: bool,
                                 gle_database: &str,
                                 offset: u32)
                                 -> Result<WriteResult> {
    let mut result = WriteResult::new();
    let flags = OpInsertFlags::with_continue_on_error(command.ordered).bits();

    let mut cursor = 0u32;
    while cursor < command.n_documents {
        let batch_start = cursor;
        let mut batch_docs: Vec<&Document> = Vec::new();
        let mut accumulated = 0u32;
        let mut i = cursor;
        let mut stop_all = false;

        while i < command.n_documents {
            let doc = clause_at(&command.payload, i).expect("contiguous insert payload");
            let len = try!(encoder::encoded_len(doc));

            if planner.is_too_large(len) {
                if !batch_docs.is_empty() {
                    break;
                }

                warn!("clause {} too large for legacy insert ({} bytes, max {})", i, len, planner.max_bson_obj_size());
                result.fail_too_large((offset + i) as i32, len as i32, planner.max_bson_obj_size() as i32);
                i += 1;
                if command.ordered {
                    stop_all = true;
                }
                break;
            }

            if planner.legacy_insert_would_overflow(accumulated, len, allow_bulk_op_insert, batch_docs.len() as u32) {
                break;
            }

            batch_docs.push(doc);
            accumulated += len;
            i += 1;
        }

        if !batch_docs.is_empty() {
            match transport.send_insert(hint, namespace, flags, &batch_docs, with_reply, gle_database) {
                Ok(Some(mut reply)) => {
                    let err_is_null = match reply.get("err") {
                        None => true,
                        Some(&Bson::Null) => true,
                        _ => false,
                    };
                    let n_is_zero = match int_field(&reply, "n") {
                        None => true,
                        Some(0) => true,
                        _ => false,
                    };

                    if err_is_null && n_is_zero {
                        reply.insert("n".to_owned(), Bson::I32(batch_docs.len() as i32));
                    }

                    result.merge_legacy(command, &reply, offset + batch_start);
                }
                Ok(None) => (),
                Err(err) => {
                    error!("legacy insert batch failed at clause {}: {}", batch_start, err);
                    result.fail(err);
                    stop_all = true;
                }
            }
        }

        cursor = i;
        if stop_all {
            break;
        }
    }

    Ok(result)
}

/// Copies `_id` from `update` or, failing that, `selector` into a
/// synthesized `upserted` field when the reply shows an upsert happened
/// but the (pre-2.6) server didn't report the generated id.
fn repair_upsert(mut reply: Document, upsert_requested: bool, update: &Document, selector: &Document) -> Document {
    if !upsert_requested || reply.contains_key("upserted") {
        return reply;
    }

    let updated_existing = bool_field(&reply, "updatedExisting");
    let n_is_one = int_field(&reply, "n") == Some(1);

    if updated_existing == Some(false) && n_is_one {
        let id = update.get("_id").cloned().or_else(|| selector.get("_id").cloned());
        if let Some(id_value) = id {
            reply.insert("upserted".to_owned(), id_value);
        }
    }

    reply
}

fn execute_update<T: Transport>(transport: &mut T,
                                 command: &WriteCommand,
                                 namespace: &str,
                                 hint: Hint,
                                 with_reply: bool,
                                 gle_database: &str,
                                 offset: u32)
                                 -> Result<WriteResult> {
    for i in 0..command.n_documents {
        let clause = clause_at(&command.payload, i).expect("contiguous update payload");
        if !clause.contains_key("q") || !clause.contains_key("u") {
            return Err(Error::BsonInvalid(format!("update clause {} is missing 'q' or 'u'", i)));
        }
    }

    let mut result = WriteResult::new();

    for i in 0..command.n_documents {
        let clause = clause_at(&command.payload, i).expect("contiguous update payload");

        let selector = match clause.get("q") {
            Some(&Bson::Document(ref d)) => d.clone(),
            _ => unreachable!("validated above"),
        };
        let update = match clause.get("u") {
            Some(&Bson::Document(ref d)) => d.clone(),
            _ => unreachable!("validated above"),
        };
        let upsert = bool_field(clause, "upsert").unwrap_or(false);
        let multi = bool_field(clause, "multi").unwrap_or(false);

        if !encoder::is_operator_update(&update) {
            try!(encoder::validate_no_dollar_or_dot_keys(&update));
        }

        let flags = OpUpdateFlags::new(upsert, multi).bits();
        match transport.send_update(hint, namespace, flags, &selector, &update, with_reply, gle_database) {
            Ok(Some(reply)) => {
                let repaired = repair_upsert(reply, upsert, &update, &selector);
                result.merge_legacy(command, &repaired, offset + i);
            }
            Ok(None) => (),
            Err(err) => {
                error!("legacy update failed at clause {}: {}", i, err);
                result.fail(err);
                if command.ordered {
                    break;
                }
            }
        }
    }

    Ok(result)
}

/// Runs `command` to completion over the legacy opcodes, merging every
/// getLastError reply into the returned result.
pub fn execute<T: Transport>(transport: &mut T,
                              server: &ServerDescription,
                              command: &WriteCommand,
                              database: &str,
                              collection: &str,
                              write_concern: &WriteConcern,
                              hint: Hint,
                              offset: u32)
                              -> Result<WriteResult> {
    let namespace = format!("{}.{}", database, collection);
    let with_reply = write_concern.needs_gle();

    match command.kind {
        Kind::Delete { .. } => execute_delete(transport, command, &namespace, hint, with_reply, database, offset),
        Kind::Insert { allow_bulk_op_insert } => {
            let planner = BatchPlanner::new(server);
            execute_insert(transport, &planner, command, &namespace, hint, allow_bulk_op_insert, with_reply, database, offset)
        }
        Kind::Update => execute_update(transport, command, &namespace, hint, with_reply, database, offset),
    }
}
