use super::{ConnectionDetails, WebsocketEvent};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decoded stream entry: the typed event plus the inbound trace token
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    pub event: WebsocketEvent,
    /// Trace propagation token carried alongside the event, if any
    pub trace_token: Option<String>,
}

/// Decodes a normalized field mapping into a typed event
///
/// Returning `None` means the entry is discarded: no handler runs, no error is
/// raised and the cursor still advances past it. Discard points, in order:
/// a missing or empty `data` field, unparseable JSON, an unrecognized `type`
/// discriminator and an empty connection or user id after coercion.
///
/// Pure function, no side effects.
pub fn decode(fields: &HashMap<String, String>, trace_field: &str) -> Option<DecodedEntry> {
    let raw = fields.get("data")?;
    if raw.is_empty() {
        return None;
    }

    let parsed: Value = serde_json::from_str(raw).ok()?;
    let object = parsed.as_object()?;

    let kind = object.get("type").and_then(Value::as_str)?;
    let connection = ConnectionDetails {
        connection_id: coerce_id(object.get("connection_id"))?,
        user_id: coerce_id(object.get("user_id"))?,
        subjects: coerce_subjects(object.get("subjects")),
        connected_at: object
            .get("connected_at")
            .and_then(Value::as_i64)
            .unwrap_or(0),
    };

    let event = match kind {
        "connected" => WebsocketEvent::ConnectionEstablished(connection),
        "disconnected" => WebsocketEvent::ConnectionClosed(connection),
        "message_received" => WebsocketEvent::MessageReceived {
            connection,
            message: object.get("message").filter(|m| !m.is_null()).cloned(),
            raw: object
                .get("raw")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        _ => return None,
    };

    Some(DecodedEntry {
        event,
        trace_token: trace_token(object, trace_field),
    })
}

/// Coerces an id to a non-empty string, accepting numbers for robustness
fn coerce_id(value: Option<&Value>) -> Option<String> {
    let coerced = match value? {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    if coerced.is_empty() {
        None
    } else {
        Some(coerced)
    }
}

/// Coerces the subject list to a set, empty when absent or malformed
fn coerce_subjects(value: Option<&Value>) -> std::collections::HashSet<String> {
    value
        .and_then(Value::as_array)
        .map(|subjects| {
            subjects
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn trace_token(object: &Map<String, Value>, trace_field: &str) -> Option<String> {
    object
        .get(trace_field)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::inbox::EventKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    const TRACE_FIELD: &str = "traceparent";

    fn entry(data: &str) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("data".to_string(), data.to_string());
        fields
    }

    #[test]
    fn decodes_a_connection_established_event() {
        let data = r#"{"type":"connected","connection_id":"c1","user_id":"u1","subjects":["room:a"],"connected_at":1000}"#;

        let decoded = decode(&entry(data), TRACE_FIELD).unwrap();

        let mut subjects = HashSet::new();
        subjects.insert("room:a".to_string());
        assert_eq!(
            decoded.event,
            WebsocketEvent::ConnectionEstablished(ConnectionDetails {
                connection_id: "c1".into(),
                user_id: "u1".into(),
                subjects,
                connected_at: 1000,
            })
        );
        assert_eq!(decoded.trace_token, None);
    }

    #[test]
    fn decodes_a_message_with_payload_and_trace_token() {
        let data = r#"{"type":"message_received","connection_id":"c1","user_id":"u1","subjects":[],"connected_at":5,"message":{"type":"chat","text":"hi"},"raw":"{\"type\":\"chat\"}","traceparent":"00-abc-def-01"}"#;

        let decoded = decode(&entry(data), TRACE_FIELD).unwrap();

        assert_eq!(decoded.event.kind(), EventKind::MessageReceived);
        assert_eq!(decoded.trace_token.as_deref(), Some("00-abc-def-01"));

        match decoded.event {
            WebsocketEvent::MessageReceived { message, raw, .. } => {
                assert_eq!(message.unwrap()["text"], "hi");
                assert_eq!(raw, "{\"type\":\"chat\"}");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn missing_or_empty_data_is_discarded() {
        assert_eq!(decode(&HashMap::new(), TRACE_FIELD), None);
        assert_eq!(decode(&entry(""), TRACE_FIELD), None);
    }

    #[test]
    fn unparseable_data_is_discarded() {
        assert_eq!(decode(&entry("not-json"), TRACE_FIELD), None);
        assert_eq!(decode(&entry("[1,2,3]"), TRACE_FIELD), None);
    }

    #[test]
    fn unrecognized_type_is_discarded() {
        let data = r#"{"type":"heartbeat","connection_id":"c1","user_id":"u1"}"#;
        assert_eq!(decode(&entry(data), TRACE_FIELD), None);
    }

    #[test]
    fn empty_ids_are_discarded() {
        let data = r#"{"type":"connected","connection_id":"","user_id":"u1"}"#;
        assert_eq!(decode(&entry(data), TRACE_FIELD), None);

        let data = r#"{"type":"connected","connection_id":"c1"}"#;
        assert_eq!(decode(&entry(data), TRACE_FIELD), None);
    }

    #[test]
    fn numeric_ids_are_coerced_to_strings() {
        let data = r#"{"type":"disconnected","connection_id":17,"user_id":42}"#;

        let connection = decode(&entry(data), TRACE_FIELD).unwrap().event.connection().clone();

        assert_eq!(connection.connection_id, "17");
        assert_eq!(connection.user_id, "42");
    }

    #[test]
    fn malformed_subjects_and_missing_timestamp_default() {
        let data = r#"{"type":"connected","connection_id":"c1","user_id":"u1","subjects":"oops"}"#;

        let connection = decode(&entry(data), TRACE_FIELD).unwrap().event.connection().clone();

        assert!(connection.subjects.is_empty());
        assert_eq!(connection.connected_at, 0);
    }

    #[test]
    fn non_string_subject_elements_are_skipped() {
        let data = r#"{"type":"connected","connection_id":"c1","user_id":"u1","subjects":["room:a",7]}"#;

        let connection = decode(&entry(data), TRACE_FIELD).unwrap().event.connection().clone();

        assert_eq!(connection.subjects.len(), 1);
        assert!(connection.subjects.contains("room:a"));
    }

    #[test]
    fn non_string_trace_token_is_absent() {
        let data = r#"{"type":"connected","connection_id":"c1","user_id":"u1","traceparent":17}"#;

        assert_eq!(decode(&entry(data), TRACE_FIELD).unwrap().trace_token, None);
    }

    #[test]
    fn null_message_decodes_to_none() {
        let data = r#"{"type":"message_received","connection_id":"c1","user_id":"u1","message":null,"raw":"x"}"#;

        match decode(&entry(data), TRACE_FIELD).unwrap().event {
            WebsocketEvent::MessageReceived { message, .. } => assert_eq!(message, None),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
