//! JSON-lines wire format for method calls.
//!
//! One JSON object per line in each direction:
//!
//! ```text
//! -> {"id":1,"channel":"photo_bridge/photo_picker","method":"pickPhoto"}
//! <- {"id":1,"status":"success","data":"89504e47..."}
//! <- {"id":1,"status":"error","code":"CAMERA_UNAVAILABLE","message":"...","details":null}
//! <- {"id":1,"status":"not_implemented"}
//! ```
//!
//! Byte payloads travel as lowercase hex strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::message::{MethodCall, MethodResponse};

/// Code answered for request lines that cannot be decoded.
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Errors raised while moving envelopes over a stream.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid channel message: {0}")]
    Json(#[from] serde_json::Error),
}

/// An incoming call, addressed to a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-chosen id echoed back in the response
    pub id: u64,
    pub channel: String,
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RequestEnvelope {
    pub fn call(&self) -> MethodCall {
        MethodCall::with_arguments(self.method.clone(), self.arguments.clone())
    }
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl ResponseEnvelope {
    pub fn new(id: u64, response: MethodResponse) -> Self {
        Self {
            id,
            body: response.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseBody {
    Success {
        #[serde(default, with = "hex_payload")]
        data: Option<Vec<u8>>,
    },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        details: Option<Value>,
    },
    NotImplemented,
}

impl From<MethodResponse> for ResponseBody {
    fn from(response: MethodResponse) -> Self {
        match response {
            MethodResponse::Success(data) => ResponseBody::Success { data },
            MethodResponse::Error {
                code,
                message,
                details,
            } => ResponseBody::Error {
                code,
                message,
                details,
            },
            MethodResponse::NotImplemented => ResponseBody::NotImplemented,
        }
    }
}

impl From<ResponseBody> for MethodResponse {
    fn from(body: ResponseBody) -> Self {
        match body {
            ResponseBody::Success { data } => MethodResponse::Success(data),
            ResponseBody::Error {
                code,
                message,
                details,
            } => MethodResponse::Error {
                code,
                message,
                details,
            },
            ResponseBody::NotImplemented => MethodResponse::NotImplemented,
        }
    }
}

/// Decode one request line.
///
/// On failure, returns the response to send back: a `BAD_REQUEST` error
/// carrying the line's `id` when one can be recovered, else id 0.
pub fn decode_request(line: &str) -> Result<RequestEnvelope, ResponseEnvelope> {
    serde_json::from_str(line).map_err(|e| {
        let id = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|value| value.get("id").and_then(Value::as_u64))
            .unwrap_or(0);
        ResponseEnvelope::new(
            id,
            MethodResponse::error(BAD_REQUEST, format!("Malformed method call: {}", e)),
        )
    })
}

/// Encode a response as one line, without the trailing newline.
pub fn encode_response(response: &ResponseEnvelope) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(response)?)
}

mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text: Option<String> = Option::deserialize(d)?;
        text.map(|text| hex::decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
