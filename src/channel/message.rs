//! Method calls and responses exchanged over a channel.

use serde_json::Value;

/// A named operation invoked across the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Operation name (e.g. `pickPhoto`)
    pub method: String,
    /// Operation arguments, `Value::Null` when there are none
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// The call succeeded; `None` is an empty success
    Success(Option<Vec<u8>>),
    /// The call failed with an identifier and a human-readable message
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    /// No handler knows this channel or method
    NotImplemented,
}

impl MethodResponse {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, MethodResponse::NotImplemented)
    }
}
