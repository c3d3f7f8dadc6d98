//! JSON envelope codec for obs-websocket frames.
//!
//! Wire format (one WebSocket text frame per message, all keys at top level):
//!
//! ```text
//! request:   {"request-type": "SetHeartbeat", "message-id": "<uuid>", "enable": true}
//! response:  {"message-id": "<uuid>", "status": "ok", ...response fields}
//!            {"message-id": "<uuid>", "status": "error", "error": "<message>"}
//! event:     {"update-type": "SwitchScenes", "scene-name": "Live", ...event fields}
//! error:     {"error": "<message>"}
//! ```
//!
//! Request parameters, response fields and event fields all sit beside the
//! envelope keys rather than under a nested object, so the codec works on the
//! frame as a whole JSON object and hands typed decoding to serde.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::frame::InboundFrame;
use crate::protocol::id::RequestId;

/// Envelope key carrying the correlation id.
pub const MESSAGE_ID: &str = "message-id";
/// Envelope key carrying the request name.
pub const REQUEST_TYPE: &str = "request-type";
/// Envelope key carrying the event name.
pub const UPDATE_TYPE: &str = "update-type";
/// Envelope key carrying a response's status.
pub const STATUS: &str = "status";
/// Envelope key carrying an error message.
pub const ERROR: &str = "error";

/// Status value marking a failed request.
const STATUS_ERROR: &str = "error";

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    /// The text is not valid JSON, or a value could not be serialized.
    #[error("invalid JSON: {0}")]
    Json(String),

    /// The frame parsed but its top level is not a JSON object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Request parameters serialized to something other than an object.
    #[error("request parameters must serialize to a JSON object, got {0}")]
    ParamsNotObject(&'static str),

    /// An envelope key is present with the wrong JSON type.
    #[error("envelope field `{0}` has the wrong type")]
    InvalidField(&'static str),

    /// A response frame carries an id but no status.
    #[error("response {id} carries no status")]
    MissingStatus { id: String },

    /// The frame has none of the keys that identify its kind.
    #[error("frame has no message id, update type or error")]
    Unclassifiable,

    /// A well-formed payload does not match the expected typed shape.
    #[error("payload does not match {type_name}: {reason}")]
    Payload {
        type_name: &'static str,
        reason: String,
    },
}

/// Pluggable frame codec.
///
/// The connection engine only ever talks to the wire through this trait, so a
/// different envelope (or a test double) can be swapped in without touching
/// the dispatch loop.
pub trait Codec: Send + Sync {
    /// Builds the frame for request `name` with correlation id `id`.
    ///
    /// `params` must be a JSON object or `null`.
    fn encode_request(&self, name: &str, id: &RequestId, params: &Value)
        -> Result<String, CodecError>;

    /// Parses and classifies one inbound frame.
    fn decode_frame(&self, frame: &str) -> Result<InboundFrame, CodecError>;
}

/// The obs-websocket 4.x JSON envelope.
///
/// # Examples
///
/// ```rust
/// use obsws_core::{Codec, InboundFrame, JsonCodec, RequestId};
/// use serde_json::json;
///
/// let codec = JsonCodec;
/// let id = RequestId::from("42");
/// let frame = codec.encode_request("GetVersion", &id, &json!({})).unwrap();
/// let sent: serde_json::Value = serde_json::from_str(&frame).unwrap();
/// assert_eq!(sent["request-type"], "GetVersion");
///
/// let reply = codec.decode_frame(r#"{"message-id":"42","status":"ok"}"#).unwrap();
/// assert!(matches!(reply, InboundFrame::Response { outcome: Ok(_), .. }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode_request(
        &self,
        name: &str,
        id: &RequestId,
        params: &Value,
    ) -> Result<String, CodecError> {
        let mut envelope = match params {
            Value::Null => Map::new(),
            Value::Object(fields) => fields.clone(),
            other => return Err(CodecError::ParamsNotObject(json_type_name(other))),
        };

        // Envelope keys are inserted last so a parameter can never shadow them.
        envelope.insert(REQUEST_TYPE.to_owned(), Value::String(name.to_owned()));
        envelope.insert(MESSAGE_ID.to_owned(), Value::String(id.to_string()));

        serde_json::to_string(&Value::Object(envelope)).map_err(|e| CodecError::Json(e.to_string()))
    }

    fn decode_frame(&self, frame: &str) -> Result<InboundFrame, CodecError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| CodecError::Json(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(CodecError::NotAnObject);
        };

        if let Some(id) = fields.get(MESSAGE_ID) {
            let id = id
                .as_str()
                .ok_or(CodecError::InvalidField(MESSAGE_ID))?
                .to_owned();
            return decode_response(id, fields);
        }

        let has_update_type = fields.contains_key(UPDATE_TYPE);

        if !has_update_type {
            if let Some(error) = fields.get(ERROR) {
                return Ok(InboundFrame::ConnectionError {
                    message: error_text(error),
                });
            }
            return Err(CodecError::Unclassifiable);
        }

        let update_type = fields
            .get(UPDATE_TYPE)
            .and_then(Value::as_str)
            .ok_or(CodecError::InvalidField(UPDATE_TYPE))?
            .to_owned();

        Ok(InboundFrame::Event {
            update_type,
            payload: Value::Object(fields),
        })
    }
}

/// Builds a `Response` frame from an object known to carry `message-id`.
fn decode_response(id: String, fields: Map<String, Value>) -> Result<InboundFrame, CodecError> {
    let failed = match fields.get(STATUS) {
        Some(Value::String(status)) => status == STATUS_ERROR,
        Some(_) => return Err(CodecError::InvalidField(STATUS)),
        None => return Err(CodecError::MissingStatus { id }),
    };

    let outcome = if failed {
        Err(fields
            .get(ERROR)
            .map(error_text)
            .unwrap_or_else(|| "unknown error".to_owned()))
    } else {
        Ok(Value::Object(fields))
    };

    Ok(InboundFrame::Response {
        id: RequestId::from(id),
        outcome,
    })
}

/// Servers send error messages as strings; anything else is rendered as JSON.
fn error_text(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serializes typed request parameters into the JSON value the codec expects.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serde cannot serialize `params`.
pub fn encode_params<P: Serialize + ?Sized>(params: &P) -> Result<Value, CodecError> {
    serde_json::to_value(params).map_err(|e| CodecError::Json(e.to_string()))
}

/// Decodes a response or event payload into its typed shape.
///
/// Unknown fields (including the envelope keys) are ignored.
///
/// # Errors
///
/// Returns [`CodecError::Payload`] naming the target type when a required field
/// is missing or has the wrong type.
pub fn decode_payload<T: DeserializeOwned>(payload: &Value) -> Result<T, CodecError> {
    T::deserialize(payload).map_err(|e| CodecError::Payload {
        type_name: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

/// `obsws_core::protocol::events::HeartbeatEvent` → `HeartbeatEvent`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
