//! End-to-end scenarios driving the dispatcher against `StubTransport`,
//! covering the command path, the legacy path, batching, and the
//! reply-merge heuristics together rather than module by module.

extern crate bson;
extern crate mongo_write_core;

use bson::{Bson, Document};

use mongo_write_core::testing::StubTransport;
use mongo_write_core::{dispatcher, ServerDescription, WriteCommand, WriteConcern};

fn modern() -> ServerDescription {
    ServerDescription::modern()
}

fn legacy() -> ServerDescription {
    ServerDescription::legacy()
}

#[test]
fn s1_insert_with_auto_id() {
    let mut a = Document::new();
    a.insert("x".to_owned(), Bson::I32(1));
    let mut b = Document::new();
    b.insert("x".to_owned(), Bson::I32(2));

    let mut command = WriteCommand::init_insert(&[a, b], true, true);

    let mut transport = StubTransport::new();
    let mut reply = Document::new();
    reply.insert("ok".to_owned(), Bson::I32(1));
    reply.insert("n".to_owned(), Bson::I32(2));
    transport.push_command_reply(reply);

    let server = ServerDescription { max_wire_version: 3, ..modern() };
    let result = dispatcher::execute(&mut transport,
                                      &server,
                                      &mut command,
                                      "db",
                                      "coll",
                                      None,
                                      &WriteConcern::new(),
                                      1,
                                      0)
        .unwrap();

    assert_eq!(result.n_inserted, 2);
    assert_eq!(result.n_matched, 0);
    assert!(!result.omit_n_modified);
    assert!(result.write_errors.is_empty());

    let sent = &transport.sent_commands[0];
    if let Some(&Bson::Array(ref docs)) = sent.get("documents") {
        assert_eq!(docs.len(), 2);
        for doc in docs {
            if let Bson::Document(ref d) = *doc {
                assert!(d.contains_key("_id"));
                assert_eq!(d.keys().next().map(|k| k.as_str()), Some("_id"));
            }
        }
    } else {
        panic!("expected a documents array");
    }
}

#[test]
fn s2_unordered_insert_with_one_too_large() {
    let small_a = {
        let mut d = Document::new();
        d.insert("x".to_owned(), Bson::I32(1));
        d
    };
    let too_large = {
        let mut d = Document::new();
        d.insert("blob".to_owned(), Bson::String("x".repeat(17 * 1024 * 1024)));
        d
    };
    let small_b = {
        let mut d = Document::new();
        d.insert("x".to_owned(), Bson::I32(2));
        d
    };

    let mut command = WriteCommand::init_insert(&[small_a, too_large, small_b], false, true);

    let mut transport = StubTransport::new();
    let mut reply_first = Document::new();
    reply_first.insert("ok".to_owned(), Bson::I32(1));
    reply_first.insert("n".to_owned(), Bson::I32(1));
    transport.push_command_reply(reply_first.clone());
    transport.push_command_reply(reply_first);

    let server = ServerDescription { max_wire_version: 3, ..modern() };
    let result = dispatcher::execute(&mut transport,
                                      &server,
                                      &mut command,
                                      "db",
                                      "coll",
                                      None,
                                      &WriteConcern::new(),
                                      1,
                                      0)
        .unwrap();

    assert_eq!(result.n_inserted, 2);
    assert_eq!(result.write_errors.get("0").map(|v| match *v {
        Bson::Document(ref d) => {
            assert_eq!(d.get("index"), Some(&Bson::I32(1)));
            assert_eq!(d.get("code"), Some(&Bson::I32(2)));
            true
        }
        _ => false,
    }), Some(true));
}

#[test]
fn s3_ordered_update_with_server_write_error() {
    let selector = Document::new();
    let update = Document::new();
    let mut command = WriteCommand::init_update(selector.clone(), update.clone(), false, false, true);
    command.append_update(selector, update, false, false);

    let mut transport = StubTransport::new();
    let mut reply = Document::new();
    reply.insert("ok".to_owned(), Bson::I32(1));
    reply.insert("n".to_owned(), Bson::I32(1));
    reply.insert("nModified".to_owned(), Bson::I32(1));
    let mut error_entry = Document::new();
    error_entry.insert("index".to_owned(), Bson::I32(1));
    error_entry.insert("code".to_owned(), Bson::I32(11000));
    error_entry.insert("errmsg".to_owned(), Bson::String("dup".to_owned()));
    reply.insert("writeErrors".to_owned(), Bson::Array(vec![Bson::Document(error_entry)]));
    transport.push_command_reply(reply);

    let server = ServerDescription { max_wire_version: 3, ..modern() };
    let result = dispatcher::execute(&mut transport,
                                      &server,
                                      &mut command,
                                      "db",
                                      "coll",
                                      None,
                                      &WriteConcern::new(),
                                      1,
                                      0)
        .unwrap();

    assert!(result.failed);
    assert_eq!(result.n_matched, 1);
    // one batch only; the ordered command did not attempt further batches
    assert_eq!(transport.sent_commands.len(), 1);
}

#[test]
fn s4_upsert_generating_new_id_command_path() {
    let mut selector = Document::new();
    selector.insert("k".to_owned(), Bson::I32(1));
    let update = Document::new();
    let mut command = WriteCommand::init_update(selector, update, true, false, true);

    let mut transport = StubTransport::new();
    let mut upsert_entry = Document::new();
    upsert_entry.insert("index".to_owned(), Bson::I32(0));
    upsert_entry.insert("_id".to_owned(), Bson::String("generated".to_owned()));

    let mut reply = Document::new();
    reply.insert("ok".to_owned(), Bson::I32(1));
    reply.insert("n".to_owned(), Bson::I32(1));
    reply.insert("nModified".to_owned(), Bson::I32(0));
    reply.insert("upserted".to_owned(), Bson::Array(vec![Bson::Document(upsert_entry)]));
    transport.push_command_reply(reply);

    let server = ServerDescription { max_wire_version: 3, ..modern() };
    let mut result = dispatcher::execute(&mut transport,
                                          &server,
                                          &mut command,
                                          "db",
                                          "coll",
                                          None,
                                          &WriteConcern::new(),
                                          1,
                                          0)
        .unwrap();

    assert_eq!(result.n_upserted, 1);
    assert_eq!(result.n_matched, 0);
    assert_eq!(result.n_modified, 0);

    let mut out = Document::new();
    result.complete(Some(&mut out));
    if let Some(&Bson::Array(ref upserted)) = out.get("upserted") {
        if let Bson::Document(ref d) = upserted[0] {
            assert_eq!(d.get("_id"), Some(&Bson::String("generated".to_owned())));
        } else {
            panic!("expected document entry");
        }
    } else {
        panic!("expected upserted array");
    }
}

#[test]
fn s5_legacy_upsert_with_non_object_id() {
    let mut selector = Document::new();
    selector.insert("_id".to_owned(), Bson::String("k".to_owned()));
    let mut update = Document::new();
    update.insert("$set".to_owned(), Bson::Document(Document::new()));
    let mut command = WriteCommand::init_update(selector, update, true, false, true);

    let mut transport = StubTransport::new();
    let mut reply = Document::new();
    reply.insert("n".to_owned(), Bson::I32(1));
    reply.insert("updatedExisting".to_owned(), Bson::Boolean(false));
    transport.push_legacy_reply(reply);

    let result = dispatcher::execute(&mut transport,
                                      &mut_transport_server(),
                                      &mut command,
                                      "db",
                                      "coll",
                                      None,
                                      &WriteConcern::new(),
                                      1,
                                      0)
        .unwrap();

    assert_eq!(result.n_upserted, 1);
    assert!(result.omit_n_modified);
}

fn mut_transport_server() -> ServerDescription {
    legacy()
}

#[test]
fn s6_unacknowledged_write_on_legacy_capable_server() {
    let mut doc = Document::new();
    doc.insert("x".to_owned(), Bson::I32(1));
    let mut command = WriteCommand::init_insert(&[doc], true, true);

    let mut transport = StubTransport::new();

    let server = ServerDescription {
        min_wire_version: 0,
        max_wire_version: 6,
        max_bson_obj_size: 16 * 1024 * 1024,
        max_write_batch_size: 1000,
        max_msg_size: 48 * 1024 * 1024,
    };

    let result = dispatcher::execute(&mut transport,
                                      &server,
                                      &mut command,
                                      "db",
                                      "coll",
                                      Some(WriteConcern::unacknowledged()),
                                      &WriteConcern::new(),
                                      1,
                                      0)
        .unwrap();

    assert!(!result.failed);
    assert_eq!(result.n_inserted, 0);
    assert!(transport.sent_commands.is_empty());
    assert_eq!(transport.sent_inserts.len(), 1);
}
