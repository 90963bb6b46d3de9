//! Thin adapter over the `bson` crate.
//!
//! The rest of this crate never calls into `bson::encode_document` or
//! walks a `Document`'s keys directly; it goes through here. That keeps
//! the "clause documents are keyed by stringified, contiguous indices"
//! convention in one place.

use bson::{self, Bson, Document};

use error::{Error, Result};

/// Renders `doc` to its wire bytes and returns how many there are. Used by
/// the batch planner to decide whether a clause fits in the current batch.
pub fn encoded_len(doc: &Document) -> Result<u32> {
    let mut buf = Vec::new();
    try!(bson::encode_document(&mut buf, doc));
    Ok(buf.len() as u32)
}

/// Appends `value` into `array_doc` under the stringified key `index`,
/// matching the "payload keys are contiguous stringified indices"
/// invariant.
pub fn append_indexed(array_doc: &mut Document, index: u32, value: Bson) {
    array_doc.insert(index.to_string(), value);
}

/// Returns the clause documents of a payload array in index order.
///
/// Payload documents store their clauses under `"0", "1", ...` keys rather
/// than in a `Bson::Array`, exactly as the source does with a `bson_t`
/// used as an append-only array; this walks them back out in order.
pub fn iter_indexed(array_doc: &Document) -> Vec<&Bson> {
    let mut out = Vec::with_capacity(array_doc.len());
    let mut i = 0;
    loop {
        match array_doc.get(&i.to_string()) {
            Some(value) => {
                out.push(value);
                i += 1;
            }
            None => break,
        }
    }
    out
}

/// True if `doc` has a top-level `_id` field.
pub fn has_id(doc: &Document) -> bool {
    doc.contains_key("_id")
}

/// Looks up the clause document stored at `index` in a payload array.
pub fn clause_at(payload: &Document, index: u32) -> Option<&Document> {
    match payload.get(&index.to_string()) {
        Some(&Bson::Document(ref d)) => Some(d),
        _ => None,
    }
}

/// Recursively checks that no key in `doc` (at any nesting depth) starts
/// with `$` or contains a `.`, and that all string values are valid UTF-8
/// (guaranteed by Rust's `String` type, so only the key shape is actually
/// checked here). This is the strict validation the legacy update path
/// runs on a replacement document.
pub fn validate_no_dollar_or_dot_keys(doc: &Document) -> Result<()> {
    for (key, value) in doc.iter() {
        if key.starts_with('$') || key.contains('.') {
            return Err(Error::BsonInvalid(format!(
                "key '{}' is invalid: keys may not start with '$' or contain '.'",
                key
            )));
        }

        if let Bson::Document(ref nested) = *value {
            try!(validate_no_dollar_or_dot_keys(nested));
        }

        if let Bson::Array(ref items) = *value {
            for item in items {
                if let Bson::Document(ref nested) = *item {
                    try!(validate_no_dollar_or_dot_keys(nested));
                }
            }
        }
    }

    Ok(())
}

/// True if `update`'s first field is an operator (its key starts with
/// `$`), i.e. it should be treated as an update-operator document rather
/// than a replacement document subject to strict key validation.
pub fn is_operator_update(update: &Document) -> bool {
    match update.iter().next() {
        Some((key, _)) => key.starts_with('$'),
        None => false,
    }
}
