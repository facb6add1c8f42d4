//! Client for the IPFS daemon's HTTP command API (`/api/v0`).
//!
//! Every endpoint goes through the same pipeline: a [`CommandRequest`]
//! (method path, positional `arg=` values, named flags, optional upload) is
//! turned into a URI by [`uri::build_uri`], sent once through the shared
//! `reqwest::Client`, and handed back as a [`ResponseBody`] that the caller
//! materializes as bytes, text, JSON or a stream.
//!
//! ```no_run
//! # async fn demo() -> ipfs_api::Result<()> {
//! use ipfs_api::{CommandRequest, IpfsClient};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = IpfsClient::local()?;
//! let cancel = CancellationToken::new();
//! let body = client
//!     .pin()
//!     .execute(CommandRequest::new("ls").flag("type", "recursive"), &cancel)
//!     .await?
//!     .text()
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod pipeline;
pub mod response;
pub mod subsystem;
pub mod uri;

pub use client::IpfsClient;
pub use command::{CommandRequest, NamedStream};
pub use config::ClientConfig;
pub use pipeline::CommandPipeline;
pub use response::ResponseBody;
pub use subsystem::Subsystem;

pub use ipfs_core::{MultiAddr, MultiHash, MultiHashError};
pub use tokio_util::sync::CancellationToken;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("daemon returned HTTP {status} with content '{body}'")]
    RemoteCommandFailed { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("client has been released")]
    Released,

    /// Malformed identifier text or bytes, for wrapper code that applies `?`
    /// to [`MultiHash::parse`] or `FromStr`.
    #[error(transparent)]
    InvalidIdentifier(#[from] MultiHashError),
    #[error(transparent)]
    InvalidUri(#[from] url::ParseError),
    #[error("invalid header {0}")]
    InvalidHeader(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Local upload source failures, for wrapper code that applies `?` to
    /// [`NamedStream::open`]. Read errors once the upload is in flight
    /// surface as [`Error::Transport`].
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn is_released(&self) -> bool {
        matches!(self, Error::Released)
    }

    /// HTTP status of a command the daemon rejected.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteCommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_upload(path: &std::path::Path) -> Result<NamedStream> {
        Ok(NamedStream::open(path).await?)
    }

    fn parse_hash(text: &str) -> Result<MultiHash> {
        Ok(text.parse::<MultiHash>()?)
    }

    #[tokio::test]
    async fn test_missing_upload_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_upload(&dir.path().join("missing.bin")).await.unwrap_err();
        match err {
            Error::Io(err) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_identifier_is_invalid_identifier() {
        let err = parse_hash("Qm0OIl").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(MultiHashError::Base58(_))), "{err:?}");
        assert!(!err.is_cancelled());
        assert_eq!(err.status(), None);

        let err = parse_hash("2").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(MultiHashError::TooShort(1))));
    }
}
