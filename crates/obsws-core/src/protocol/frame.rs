//! The decoded shape of one inbound frame.

use serde_json::Value;

use crate::protocol::id::RequestId;

/// One frame read from the server, classified by the codec.
///
/// The three variants are mutually exclusive:
///
/// | Variant           | Wire marker                          |
/// |-------------------|--------------------------------------|
/// | `Response`        | has `message-id`                     |
/// | `ConnectionError` | no id, has `error`, no `update-type` |
/// | `Event`           | has `update-type`                    |
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// A reply to an earlier request.
    ///
    /// `outcome` is `Ok(payload)` for `status: "ok"` (the payload is the whole
    /// frame object, response fields sit beside the envelope keys) and
    /// `Err(message)` for `status: "error"`.
    Response {
        id: RequestId,
        outcome: Result<Value, String>,
    },

    /// A server-pushed event.  `payload` is the whole frame object.
    Event { update_type: String, payload: Value },

    /// An error not tied to any request.
    ///
    /// The protocol never documents when the server sends this shape, so it is
    /// only ever reported to observers.
    ConnectionError { message: String },
}

impl InboundFrame {
    /// Short variant name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::Response { .. } => "response",
            InboundFrame::Event { .. } => "event",
            InboundFrame::ConnectionError { .. } => "connection-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_each_variant() {
        let response = InboundFrame::Response {
            id: RequestId::from("1"),
            outcome: Ok(Value::Null),
        };
        let event = InboundFrame::Event {
            update_type: "Exiting".to_string(),
            payload: Value::Null,
        };
        let error = InboundFrame::ConnectionError {
            message: "boom".to_string(),
        };

        assert_eq!(response.kind(), "response");
        assert_eq!(event.kind(), "event");
        assert_eq!(error.kind(), "connection-error");
    }
}
