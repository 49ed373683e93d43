//! Serves a [`ChannelRegistry`] over a JSON-lines byte stream.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use super::codec::{decode_request, encode_response, ChannelError, ResponseEnvelope};
use super::registry::ChannelRegistry;

/// Answer calls read from `reader` until it closes or `shutdown` completes.
///
/// Every call is handled on its own task, so a slow call (a capture waiting
/// on the user) does not hold up the ones behind it. Responses are written
/// in completion order, matched to calls by `id`.
///
/// On end of input the server waits for in-flight calls to be answered. On
/// `shutdown` it first shuts the registry down so pending calls are released.
pub async fn serve<R, W, S>(
    registry: Arc<ChannelRegistry>,
    reader: R,
    writer: W,
    shutdown: S,
) -> Result<(), ChannelError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (tx, rx) = mpsc::unbounded_channel::<ResponseEnvelope>();
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutting down channel host");
                registry.shutdown();
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            log::debug!("Channel input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match decode_request(&line) {
            Ok(request) => {
                log::debug!(
                    "Call {} -> {}::{}",
                    request.id,
                    request.channel,
                    request.method
                );
                let registry = Arc::clone(&registry);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = registry.dispatch(&request.channel, request.call()).await;
                    let _ = tx.send(ResponseEnvelope::new(request.id, response));
                });
            }
            Err(response) => {
                log::warn!("Rejected malformed call line: {}", line);
                let _ = tx.send(response);
            }
        }
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| ChannelError::Io(std::io::Error::other(e)))?
}

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio<S>(registry: Arc<ChannelRegistry>, shutdown: S) -> Result<(), ChannelError>
where
    S: Future<Output = ()>,
{
    serve(
        registry,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown,
    )
    .await
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<ResponseEnvelope>,
) -> Result<(), ChannelError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = encode_response(&response)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MethodCall, MethodCallHandler, MethodResponse};
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::io::duplex;

    struct Upper;

    #[async_trait]
    impl MethodCallHandler for Upper {
        async fn handle(&self, call: MethodCall) -> MethodResponse {
            match call.method.as_str() {
                "upper" => {
                    let text = call.arguments.as_str().unwrap_or_default().to_uppercase();
                    MethodResponse::Success(Some(text.into_bytes()))
                }
                _ => MethodResponse::NotImplemented,
            }
        }
    }

    async fn run(input: &str) -> Vec<Value> {
        let mut registry = ChannelRegistry::new();
        registry.register("test/upper", Arc::new(Upper));

        let (out_writer, out_reader) = duplex(4096);
        serve(
            Arc::new(registry),
            input.as_bytes(),
            out_writer,
            std::future::pending(),
        )
        .await
        .unwrap();

        let mut lines = BufReader::new(out_reader).lines();
        let mut responses = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            responses.push(serde_json::from_str(&line).unwrap());
        }
        responses
    }

    #[tokio::test]
    async fn test_serve_answers_each_call() {
        let input = concat!(
            r#"{"id":1,"channel":"test/upper","method":"upper","arguments":"abc"}"#,
            "\n",
            r#"{"id":2,"channel":"test/upper","method":"lower"}"#,
            "\n",
        );
        let mut responses = run(input).await;
        responses.sort_by_key(|r| r["id"].as_u64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["status"], "success");
        assert_eq!(responses[0]["data"], hex::encode("ABC"));
        assert_eq!(responses[1]["status"], "not_implemented");
    }

    #[tokio::test]
    async fn test_serve_skips_blank_lines_and_rejects_garbage() {
        let input = "\n   \nthis is not json\n";
        let responses = run(input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 0);
        assert_eq!(responses[0]["status"], "error");
        assert_eq!(responses[0]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_serve_unknown_channel() {
        let input = r#"{"id":7,"channel":"test/nowhere","method":"upper"}"#;
        let responses = run(input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
        assert_eq!(responses[0]["status"], "not_implemented");
    }
}
