//! Routing of method calls to handlers registered under channel names.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::message::{MethodCall, MethodResponse};

/// Receives the method calls of one channel.
#[async_trait]
pub trait MethodCallHandler: Send + Sync {
    async fn handle(&self, call: MethodCall) -> MethodResponse;

    /// Release anything still waiting on the host. Called once when the
    /// channel host stops.
    fn shutdown(&self) {}
}

/// Channel name to handler table.
#[derive(Default, Clone)]
pub struct ChannelRegistry {
    handlers: HashMap<String, Arc<dyn MethodCallHandler>>,
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.channels())
            .finish()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `channel`, replacing any previous handler.
    pub fn register(&mut self, channel: impl Into<String>, handler: Arc<dyn MethodCallHandler>) {
        let channel = channel.into();
        if self.handlers.insert(channel.clone(), handler).is_some() {
            log::warn!("Replaced handler for channel '{}'", channel);
        } else {
            log::debug!("Registered channel '{}'", channel);
        }
    }

    /// Registered channel names, sorted.
    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Route `call` to the handler of `channel`.
    ///
    /// Unknown channels answer `NotImplemented`.
    pub async fn dispatch(&self, channel: &str, call: MethodCall) -> MethodResponse {
        match self.handlers.get(channel) {
            Some(handler) => handler.handle(call).await,
            None => {
                log::warn!(
                    "No handler for channel '{}' (method '{}')",
                    channel,
                    call.method
                );
                MethodResponse::NotImplemented
            }
        }
    }

    /// Shut down every registered handler.
    pub fn shutdown(&self) {
        for handler in self.handlers.values() {
            handler.shutdown();
        }
    }
}
