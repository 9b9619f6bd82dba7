//! JSON-RPC 2.0 message types for the server side of the protocol.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The message is not a valid request, or arrived in the wrong state.
pub const INVALID_REQUEST: i64 = -32600;
/// No enabled provider handles the method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// The parameters do not match the method.
pub const INVALID_PARAMS: i64 = -32602;
/// The handler failed.
pub const INTERNAL_ERROR: i64 = -32603;
/// A request arrived before `initialize`.
pub const SERVER_NOT_INITIALIZED: i64 = -32002;

/// Request identifier as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(formatter, "{id}"),
            Self::String(id) => formatter.write_str(id),
        }
    }
}

/// A request expecting exactly one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Identifier echoed in the response.
    pub id: RequestId,
    /// Method to invoke.
    pub method: String,
    /// Parameters, `null` when omitted.
    pub params: Value,
}

/// A notification; no response is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Method to invoke.
    pub method: String,
    /// Parameters, `null` when omitted.
    pub params: Value,
}

/// An inbound message after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client request.
    Request(Request),
    /// Client notification.
    Notification(Notification),
    /// Response to a server-initiated request. The server sends none, so
    /// these are only logged.
    Response {
        /// Identifier of the answered request.
        id: Option<RequestId>,
    },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

impl Message {
    /// Parses and classifies a message payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is not a JSON-RPC
    /// message object.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawMessage = serde_json::from_slice(payload)?;
        let params = raw.params.unwrap_or(Value::Null);
        Ok(match (raw.method, raw.id) {
            (Some(method), Some(id)) => Self::Request(Request { id, method, params }),
            (Some(method), None) => Self::Notification(Notification { method, params }),
            (None, id) => Self::Response { id },
        })
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Creates an error with no data.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    /// Attaches structured data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Identifier of the answered request; `null` when it could not be read.
    pub id: Option<RequestId>,
    /// The result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: String::from("2.0"),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn failure(id: Option<RequestId>, error: ResponseError) -> Self {
        Self {
            jsonrpc: String::from("2.0"),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Creates a response from a handler result.
    #[must_use]
    pub fn from_result(id: RequestId, result: Result<Value, ResponseError>) -> Self {
        match result {
            Ok(value) => Self::success(id, value),
            Err(error) => Self::failure(Some(id), error),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn classifies_requests() {
        let message = Message::parse(br#"{"jsonrpc":"2.0","id":7,"method":"shutdown"}"#)
            .expect("parse failed");

        assert_eq!(
            message,
            Message::Request(Request {
                id: RequestId::Number(7),
                method: String::from("shutdown"),
                params: Value::Null,
            })
        );
    }

    #[rstest]
    fn classifies_notifications() {
        let message =
            Message::parse(br#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#)
                .expect("parse failed");

        assert_eq!(
            message,
            Message::Notification(Notification {
                method: String::from("initialized"),
                params: json!({}),
            })
        );
    }

    #[rstest]
    fn accepts_string_identifiers() {
        let message = Message::parse(br#"{"jsonrpc":"2.0","id":"a-1","method":"x"}"#)
            .expect("parse failed");

        assert!(matches!(
            message,
            Message::Request(Request { id: RequestId::String(ref id), .. }) if id == "a-1"
        ));
    }

    #[rstest]
    fn classifies_client_responses() {
        let message =
            Message::parse(br#"{"jsonrpc":"2.0","id":3,"result":null}"#).expect("parse failed");
        assert_eq!(
            message,
            Message::Response {
                id: Some(RequestId::Number(3))
            }
        );
    }

    #[rstest]
    fn rejects_non_objects() {
        assert!(Message::parse(b"[1, 2]").is_err());
        assert!(Message::parse(b"not json").is_err());
    }

    #[rstest]
    fn null_result_is_serialised() {
        let response = Response::success(RequestId::Number(1), Value::Null);
        let json = serde_json::to_value(&response).expect("serialization failed");

        assert_eq!(json, json!({"jsonrpc": "2.0", "id": 1, "result": null}));
    }

    #[rstest]
    fn error_response_omits_result() {
        let response = Response::failure(
            None,
            ResponseError::new(PARSE_ERROR, "bad payload").with_data(json!({"offset": 3})),
        );
        let json = serde_json::to_value(&response).expect("serialization failed");

        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32700, "message": "bad payload", "data": {"offset": 3}}
            })
        );
    }
}
