use super::{RawEntry, StreamBatch};
use redis::Value;
use std::collections::HashMap;

/// Observed encoding of the fields belonging to one stream entry
///
/// Backends (and backend client versions) disagree on how the field list of an
/// entry is represented: some deliver a ready-made key-indexed mapping, others a
/// flat alternating key/value sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEncoding {
    /// Fields already arrived as a key-indexed mapping
    Keyed(HashMap<String, String>),
    /// Fields arrived as a flat alternating `[key, value, key, value, ..]` sequence
    Flat(Vec<String>),
}

/// Converts any observed field encoding into a canonical key-indexed mapping
///
/// Total function: unparseable or empty input normalizes to an empty mapping,
/// never an error. A trailing key without a value is dropped.
pub fn normalize(encoding: FieldEncoding) -> HashMap<String, String> {
    match encoding {
        FieldEncoding::Keyed(fields) => fields,
        FieldEncoding::Flat(sequence) => {
            let mut fields = HashMap::with_capacity(sequence.len() / 2);
            let mut iterator = sequence.into_iter();

            while let (Some(key), Some(value)) = (iterator.next(), iterator.next()) {
                fields.insert(key, value);
            }

            fields
        }
    }
}

/// Determines the [`FieldEncoding`] of a raw wire value
///
/// A bulk of scalars is treated as a flat alternating sequence, a bulk of
/// two-element bulks as a key-indexed mapping. Anything else classifies as an
/// empty sequence so that normalization stays total.
pub fn classify(value: &Value) -> FieldEncoding {
    let items = match value {
        Value::Bulk(items) => items,
        _ => return FieldEncoding::Flat(Vec::new()),
    };

    if items.iter().all(|item| scalar(item).is_some()) {
        return FieldEncoding::Flat(items.iter().filter_map(scalar).collect());
    }

    let mut fields = HashMap::with_capacity(items.len());
    for item in items {
        match item {
            Value::Bulk(pair) if pair.len() == 2 => {
                if let (Some(key), Some(value)) = (scalar(&pair[0]), scalar(&pair[1])) {
                    fields.insert(key, value);
                    continue;
                }
                return FieldEncoding::Flat(Vec::new());
            }
            _ => return FieldEncoding::Flat(Vec::new()),
        }
    }

    FieldEncoding::Keyed(fields)
}

/// Parses a raw `XREAD` reply into per-stream batches of normalized entries
///
/// Malformed sections of the reply are skipped rather than failing the read;
/// a `Nil` reply (blocking read timeout) yields no batches.
pub(crate) fn parse_read_reply(reply: Value) -> Vec<StreamBatch> {
    let streams = match reply {
        Value::Bulk(streams) => streams,
        _ => return Vec::new(),
    };

    streams
        .into_iter()
        .filter_map(|stream| {
            let mut parts = match stream {
                Value::Bulk(parts) if parts.len() == 2 => parts.into_iter(),
                _ => return None,
            };

            let name = scalar(&parts.next()?)?;
            let entries = match parts.next()? {
                Value::Bulk(entries) => entries,
                _ => return None,
            };

            Some(StreamBatch {
                stream: name,
                entries: entries.into_iter().filter_map(parse_entry).collect(),
            })
        })
        .collect()
}

fn parse_entry(entry: Value) -> Option<RawEntry> {
    let mut parts = match entry {
        Value::Bulk(parts) if parts.len() == 2 => parts.into_iter(),
        _ => return None,
    };

    let id = scalar(&parts.next()?)?;
    let fields = normalize(classify(&parts.next()?));

    Some(RawEntry { id, fields })
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Data(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Status(text) => Some(text.clone()),
        Value::Int(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data(text: &str) -> Value {
        Value::Data(text.as_bytes().to_vec())
    }

    #[test]
    fn keyed_input_passes_through_unchanged() {
        let mut fields = HashMap::new();
        fields.insert("data".to_string(), "{}".to_string());
        fields.insert("origin".to_string(), "gw-1".to_string());

        assert_eq!(normalize(FieldEncoding::Keyed(fields.clone())), fields);
    }

    #[test]
    fn flat_sequence_becomes_a_mapping() {
        let normalized = normalize(FieldEncoding::Flat(vec![
            "data".to_string(),
            "{}".to_string(),
            "origin".to_string(),
            "gw-1".to_string(),
        ]));

        assert_eq!(normalized.get("data").map(String::as_str), Some("{}"));
        assert_eq!(normalized.get("origin").map(String::as_str), Some("gw-1"));
    }

    #[test]
    fn trailing_key_without_value_is_dropped() {
        let normalized = normalize(FieldEncoding::Flat(vec![
            "data".to_string(),
            "{}".to_string(),
            "orphan".to_string(),
        ]));

        assert_eq!(normalized.len(), 1);
        assert!(!normalized.contains_key("orphan"));
    }

    #[test]
    fn empty_input_normalizes_to_an_empty_mapping() {
        assert!(normalize(FieldEncoding::Flat(Vec::new())).is_empty());
        assert!(normalize(FieldEncoding::Keyed(HashMap::new())).is_empty());
    }

    #[test]
    fn classifies_alternating_scalars_as_flat() {
        let value = Value::Bulk(vec![data("data"), data("{}")]);

        assert_eq!(
            classify(&value),
            FieldEncoding::Flat(vec!["data".to_string(), "{}".to_string()])
        );
    }

    #[test]
    fn classifies_pair_bulks_as_keyed() {
        let value = Value::Bulk(vec![Value::Bulk(vec![data("data"), data("{}")])]);

        match classify(&value) {
            FieldEncoding::Keyed(fields) => {
                assert_eq!(fields.get("data").map(String::as_str), Some("{}"))
            }
            other => panic!("expected keyed encoding, got {:?}", other),
        }
    }

    #[test]
    fn garbage_classifies_as_empty() {
        assert_eq!(classify(&Value::Nil), FieldEncoding::Flat(Vec::new()));
        assert_eq!(
            classify(&Value::Bulk(vec![Value::Bulk(vec![data("lonely")])])),
            FieldEncoding::Flat(Vec::new())
        );
    }

    #[test]
    fn parses_a_full_read_reply() {
        let reply = Value::Bulk(vec![Value::Bulk(vec![
            data("ws.inbox"),
            Value::Bulk(vec![Value::Bulk(vec![
                data("1-1"),
                Value::Bulk(vec![data("data"), data("{}")]),
            ])]),
        ])]);

        let batches = parse_read_reply(reply);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].stream, "ws.inbox");
        assert_eq!(batches[0].entries.len(), 1);
        assert_eq!(batches[0].entries[0].id, "1-1");
        assert_eq!(
            batches[0].entries[0].fields.get("data").map(String::as_str),
            Some("{}")
        );
    }

    #[test]
    fn timeout_reply_yields_no_batches() {
        assert!(parse_read_reply(Value::Nil).is_empty());
    }
}
