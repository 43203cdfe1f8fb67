//! Wire model and codecs for the topology event feed.
//!
//! Every inbound message is a [`Frame`]: an event-type tag plus a JSON
//! payload. Text messages carry the frame as JSON; binary messages carry it as
//! protobuf with the payload encoded as a `google.protobuf.Value`.

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by the frame decoders.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text could not be parsed as a JSON frame.
    #[error("failed to decode json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The frame has an empty event-type tag.
    #[error("frame has no event type")]
    MissingType,
}

/// A single server-pushed message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Event-type tag, e.g. `"addDevice"` or `"topo.update"`.
    #[serde(rename = "type", alias = "event")]
    pub event: String,
    /// Server sequence id, when the server numbers its pushes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<u64>,
    /// Arbitrary JSON payload. Missing payloads decode as an empty object.
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

impl Frame {
    #[must_use]
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self { event: event.into(), sid: None, payload }
    }

    #[must_use]
    pub fn with_sid(mut self, sid: u64) -> Self {
        self.sid = Some(sid);
        self
    }
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

/// Decode a JSON text message into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON and
/// [`CodecError::MissingType`] when the tag is empty.
pub fn decode_text(text: &str) -> Result<Frame, CodecError> {
    let frame: Frame = serde_json::from_str(text)?;
    if frame.event.is_empty() {
        return Err(CodecError::MissingType);
    }
    Ok(frame)
}

/// Encode a frame as a JSON text message.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the payload cannot be serialized.
pub fn encode_text(frame: &Frame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = WireFrame {
        event: frame.event.clone(),
        sid: frame.sid,
        payload: Some(json_to_proto_value(&frame.payload)),
    };
    wire.encode_to_vec()
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::MissingType`] when the tag is empty.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    if wire.event.is_empty() {
        return Err(CodecError::MissingType);
    }
    Ok(Frame {
        event: wire.event,
        sid: wire.sid,
        payload: wire.payload.map_or_else(empty_payload, |v| proto_to_json_value(&v)),
    })
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(v) => Kind::BoolValue(*v),
        Value::Number(v) => Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => Kind::StringValue(v.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(fields) => Kind::StructValue(prost_types::Struct {
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    use prost_types::value::Kind;

    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        Kind::NullValue(_) => Value::Null,
        Kind::NumberValue(v) => number_value(*v),
        Kind::StringValue(v) => Value::String(v.clone()),
        Kind::BoolValue(v) => Value::Bool(*v),
        Kind::StructValue(s) => Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        Kind::ListValue(l) => Value::Array(l.values.iter().map(proto_to_json_value).collect()),
    }
}

/// Protobuf numbers are always doubles; integral values come back as JSON
/// integers so ids and counters survive a binary hop unchanged.
#[allow(clippy::cast_possible_truncation)]
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    event: String,
    #[prost(uint64, optional, tag = "2")]
    sid: Option<u64>,
    #[prost(message, optional, tag = "3")]
    payload: Option<prost_types::Value>,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
