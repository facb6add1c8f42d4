use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::command::{CommandRequest, NamedStream};
use crate::response::ResponseBody;
use crate::{Error, Result, uri};

/// Shared execution core behind every subsystem handle.
///
/// Cloning is cheap; all clones share one transport slot. Once
/// [`CommandPipeline::release`] has run, every clone fails with
/// [`Error::Released`] before touching the network.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    transport: Arc<RwLock<Option<reqwest::Client>>>,
}

impl CommandPipeline {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            transport: Arc::new(RwLock::new(Some(http_client))),
        }
    }

    /// Drops the transport. Returns `true` only for the call that actually
    /// released it.
    pub fn release(&self) -> bool {
        let released = self
            .transport
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if released {
            debug!("command pipeline released");
        }
        released
    }

    pub fn is_released(&self) -> bool {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn transport(&self) -> Result<reqwest::Client> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::Released)
    }

    /// Resolves `request` against `base` and sends it: a multipart POST when
    /// it carries an upload, a GET otherwise.
    pub async fn execute(
        &self,
        base: &Url,
        mut request: CommandRequest,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        let uri = uri::build_uri(base, request.method(), request.arg_values(), request.raw_flags())?;
        match request.take_upload() {
            Some((field_name, payload)) => {
                self.execute_post_multipart(uri, &field_name, payload, cancel)
                    .await
            }
            None => self.execute_get(uri, cancel).await,
        }
    }

    pub async fn execute_get(&self, uri: Url, cancel: &CancellationToken) -> Result<ResponseBody> {
        let http = self.transport()?;
        if cancel.is_cancelled() {
            debug!(%uri, "command cancelled before dispatch");
            return Err(Error::Cancelled);
        }
        debug!(%uri, "GET");
        self.dispatch(http.get(uri), cancel).await
    }

    pub async fn execute_post_multipart(
        &self,
        uri: Url,
        field_name: &str,
        payload: NamedStream,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        let http = self.transport()?;
        if cancel.is_cancelled() {
            debug!(%uri, "command cancelled before dispatch");
            return Err(Error::Cancelled);
        }
        debug!(%uri, file_name = %payload.file_name, "POST multipart");
        let form = reqwest::multipart::Form::new().part(field_name.to_owned(), payload.into_part()?);
        self.dispatch(http.post(uri).multipart(form), cancel).await
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("command cancelled in flight");
                return Err(Error::Cancelled);
            }
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let url = response.url().clone();
            // best effort, the status is what matters
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => String::new(),
                text = response.text() => text.unwrap_or_default(),
            };
            warn!(%url, status = status.as_u16(), "daemon rejected command");
            return Err(Error::RemoteCommandFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ResponseBody::new(response, cancel.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_base() -> Url {
        // grab a free port and close it again so connects are refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Url::parse(&format!("http://127.0.0.1:{port}/api/v0")).unwrap()
    }

    #[test]
    fn test_release_happens_once() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        let clone = pipeline.clone();
        assert!(!clone.is_released());
        assert!(pipeline.release());
        assert!(!pipeline.release());
        assert!(!clone.release());
        assert!(clone.is_released());
    }

    #[tokio::test]
    async fn test_released_pipeline_fails_fast() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        pipeline.release();
        let cancel = CancellationToken::new();
        let err = pipeline
            .execute(&unreachable_base(), CommandRequest::new("version"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_released(), "{err:?}");
    }

    #[tokio::test]
    async fn test_released_takes_precedence_over_cancelled() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        pipeline.release();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline
            .execute(&unreachable_base(), CommandRequest::new("version"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_released());
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline
            .execute(&unreachable_base(), CommandRequest::new("version"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_cancelled_upload_before_dispatch() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request =
            CommandRequest::new("add").upload(NamedStream::from_bytes("a.txt", "hello"));
        let err = pipeline
            .execute(&unreachable_base(), request, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled(), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_transport_error() {
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        let cancel = CancellationToken::new();
        let err = pipeline
            .execute(&unreachable_base(), CommandRequest::new("version"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
    }
}
