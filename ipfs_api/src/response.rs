use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Body of a successful command response, not yet read.
///
/// Reading observes the cancellation token of the call that produced it, so
/// a cancelled download surfaces as [`Error::Cancelled`] rather than as a
/// transport failure.
#[derive(Debug)]
pub struct ResponseBody {
    response: reqwest::Response,
    cancel: CancellationToken,
}

impl ResponseBody {
    pub(crate) fn new(response: reqwest::Response, cancel: CancellationToken) -> Self {
        Self { response, cancel }
    }

    pub fn status(&self) -> reqwest::StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &reqwest::header::HeaderMap {
        self.response.headers()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    pub async fn bytes(self) -> Result<Bytes> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            bytes = self.response.bytes() => Ok(bytes?),
        }
    }

    pub async fn text(self) -> Result<String> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            text = self.response.text() => Ok(text?),
        }
    }

    /// Decodes the body as JSON. Target types should mark optional fields
    /// with `#[serde(default)]`; the daemon omits or nulls them freely.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Streams the body in chunks as they arrive.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + Unpin + 'static {
        let body = self.response.bytes_stream().map_err(Error::from).boxed();
        futures::stream::unfold(
            (body, self.cancel, false),
            |(mut body, cancel, done)| async move {
                if done {
                    return None;
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Some((Err(Error::Cancelled), (body, cancel, true))),
                    item = body.next() => item.map(|item| (item, (body, cancel, false))),
                }
            },
        )
        .boxed()
    }

    /// Adapts the body stream into an `AsyncRead`.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin + 'static {
        StreamReader::new(self.into_stream().map_err(std::io::Error::other))
    }
}
