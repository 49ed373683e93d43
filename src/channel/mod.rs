//! Named method channels between a calling layer and native handlers.
//!
//! # Structure
//!
//! - [`message`] - Method calls and responses
//! - [`registry`] - Handler trait and channel routing
//! - [`codec`] - JSON-lines wire format
//! - [`server`] - Stream server for a registry

mod codec;
mod message;
mod registry;
mod server;

pub use codec::{
    decode_request, encode_response, ChannelError, RequestEnvelope, ResponseBody,
    ResponseEnvelope, BAD_REQUEST,
};
pub use message::{MethodCall, MethodResponse};
pub use registry::{ChannelRegistry, MethodCallHandler};
pub use server::{serve, serve_stdio};
