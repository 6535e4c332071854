// Newline-delimited JSON inbound channel (push events, interactions, controls)
use crate::domain::events::InboundMessage;
use bytes::{Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::LinesStream;

/// Decode one NDJSON line. Blank lines are skipped, bad ones logged.
pub fn decode_line(line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<InboundMessage>(line) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!("Skipping undecodable inbound line: {} ({})", e, line);
            None
        }
    }
}

/// Split a chunked byte stream into lines. A trailing partial line is
/// emitted when the stream ends.
pub fn ndjson_lines<S, E>(chunks: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        let mut buffer = BytesMut::new();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => buffer.extend_from_slice(&bytes),
                Err(e) => {
                    tracing::warn!("Push stream error: {}", e);
                    break;
                }
            }
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(pos + 1);
                yield String::from_utf8_lossy(&line[..pos]).into_owned();
            }
        }

        if !buffer.is_empty() {
            yield String::from_utf8_lossy(&buffer).into_owned();
        }
    }
}

/// Decode lines and forward them to the runtime. Returns how many messages
/// were forwarded before the input ended or the runtime went away.
pub async fn forward_messages<S>(lines: S, tx: &mpsc::Sender<InboundMessage>) -> usize
where
    S: Stream<Item = String>,
{
    futures::pin_mut!(lines);
    let mut forwarded = 0;
    while let Some(line) = lines.next().await {
        if let Some(message) = decode_line(&line) {
            if tx.send(message).await.is_err() {
                break;
            }
            forwarded += 1;
        }
    }
    forwarded
}

pub fn spawn_stdin_reader(tx: mpsc::Sender<InboundMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines()).filter_map(
            |line| async move {
                match line {
                    Ok(line) => Some(line),
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        None
                    }
                }
            },
        );
        let forwarded = forward_messages(lines, &tx).await;
        tracing::info!("stdin closed after {} messages", forwarded);
    })
}

/// Follow an NDJSON push stream served over HTTP.
pub fn spawn_http_reader(
    client: reqwest::Client,
    url: String,
    tx: mpsc::Sender<InboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let response = client
            .get(&url)
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(response) => {
                tracing::info!("Connected to push stream {}", url);
                let forwarded = forward_messages(ndjson_lines(response.bytes_stream()), &tx).await;
                tracing::info!("Push stream {} ended after {} messages", url, forwarded);
            }
            Err(e) => tracing::error!("Failed to open push stream {}: {}", url, e),
        }
    })
}
