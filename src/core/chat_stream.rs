use futures_util::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::request::RequestDescriptor;
use crate::core::stream_decoder::{DecoderState, StreamDecoder};
use crate::core::stream_errors::{classify_server_response, classify_transport_error, ChatError};

#[derive(Clone, Debug)]
pub enum StreamMessage {
    /// The server accepted the request and the body is being read.
    Started,
    Chunk(String),
    /// Terminal failure; no further messages follow for this stream.
    Error(ChatError),
    End,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub request: RequestDescriptor,
    pub read_timeout: Option<Duration>,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

/// Build the HTTP client shared by every exchange of a session.
pub fn build_http_client(connect_timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build()
}

struct StreamSink {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
}

impl StreamSink {
    fn send(&self, message: StreamMessage) {
        let _ = self.tx.send((message, self.stream_id));
    }
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let sink = StreamSink {
            tx: self.tx.clone(),
            stream_id: params.stream_id,
        };
        tokio::spawn(async move {
            let StreamParams {
                client,
                request,
                read_timeout,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = run_exchange(&client, request, read_timeout, &cancel_token, &sink) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "Stream cancelled by consumer");
                }
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

async fn run_exchange(
    client: &reqwest::Client,
    request: RequestDescriptor,
    read_timeout: Option<Duration>,
    cancel_token: &CancellationToken,
    sink: &StreamSink,
) {
    debug!(stream_id = sink.stream_id, endpoint = %request.endpoint, mode = %request.body.mode, "Sending analyze request");

    let sent = within(read_timeout, request.into_http_request(client).send()).await;
    let response = match sent {
        Some(Ok(response)) => response,
        Some(Err(err)) => {
            warn!(stream_id = sink.stream_id, error = %err, "Analyze request failed before a response");
            sink.send(StreamMessage::Error(classify_transport_error(&err)));
            return;
        }
        None => {
            warn!(stream_id = sink.stream_id, ?read_timeout, "Timed out waiting for response headers");
            sink.send(StreamMessage::Error(ChatError::read_timed_out()));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        // A stalled error body still reports the status.
        let body = match within(read_timeout, response.text()).await {
            Some(body) => body.unwrap_or_default(),
            None => {
                debug!(stream_id = sink.stream_id, %status, "Timed out reading error body");
                String::new()
            }
        };
        warn!(stream_id = sink.stream_id, %status, "Analyze request rejected by server");
        sink.send(StreamMessage::Error(classify_server_response(status, &body)));
        return;
    }

    sink.send(StreamMessage::Started);

    let mut decoder = StreamDecoder::new();
    decoder.start();
    let mut stream = response.bytes_stream();

    loop {
        let Some(next) = within(read_timeout, stream.next()).await else {
            decoder.fail();
            warn!(stream_id = sink.stream_id, ?read_timeout, "Timed out waiting for stream data");
            sink.send(StreamMessage::Error(ChatError::read_timed_out()));
            return;
        };

        if cancel_token.is_cancelled() {
            return;
        }

        match next {
            Some(Ok(bytes)) => {
                let state = decoder.feed(&bytes, |fragment| {
                    sink.send(StreamMessage::Chunk(fragment.to_string()))
                });
                if state == DecoderState::Done {
                    break;
                }
            }
            Some(Err(err)) => {
                decoder.fail();
                warn!(stream_id = sink.stream_id, error = %err, "Response stream failed mid-read");
                sink.send(StreamMessage::Error(ChatError::stream_interrupted(&err)));
                return;
            }
            None => {
                decoder.finish(|fragment| sink.send(StreamMessage::Chunk(fragment.to_string())));
                break;
            }
        }
    }

    sink.send(StreamMessage::End);
}

/// Await `future`, giving up after `limit`. `None` means the limit elapsed.
async fn within<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}
