use std::sync::Arc;

use ipfs_core::{MultiAddr, MultiHash};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::command::{CommandRequest, NamedStream};
use crate::config::ClientConfig;
use crate::pipeline::CommandPipeline;
use crate::response::ResponseBody;
use crate::subsystem::Subsystem;
use crate::Result;

macro_rules! subsystems {
    ($($field:ident => $path:literal, $doc:literal;)+) => {
        #[derive(Debug)]
        struct Subsystems {
            root: Subsystem,
            $($field: Subsystem,)+
        }

        impl Subsystems {
            fn new(base: &Url, pipeline: &CommandPipeline) -> Result<Self> {
                Ok(Self {
                    root: Subsystem::new("", base, pipeline.clone())?,
                    $($field: Subsystem::new($path, base, pipeline.clone())?,)+
                })
            }
        }

        impl IpfsClient {
            $(
                #[doc = $doc]
                pub fn $field(&self) -> &Subsystem {
                    &self.subsystems.$field
                }
            )+
        }
    };
}

subsystems! {
    bitswap => "bitswap", "Bitswap agent commands.";
    block => "block", "Raw block commands.";
    bootstrap => "bootstrap", "Bootstrap peer list commands.";
    config => "config", "Daemon configuration commands.";
    dht => "dht", "DHT query commands.";
    diag => "diag", "Diagnostics commands.";
    file => "file", "Unix filesystem object commands.";
    log => "log", "Event log commands.";
    name => "name", "IPNS publish/resolve commands.";
    object => "object", "DAG object commands.";
    pin => "pin", "Pinning commands.";
    refs => "refs", "Link listing commands.";
    repo => "repo", "Repository maintenance commands.";
    stats => "stats", "Statistics commands.";
    swarm => "swarm", "Peer connection commands.";
    tour => "tour", "Introductory tour commands.";
    update => "update", "Daemon self-update commands.";
}

/// Top-level handle for one daemon.
///
/// Owns the transport; clones share it together with its release state.
/// After [`IpfsClient::release`], every command from this client or any of
/// its subsystem handles fails with [`crate::Error::Released`].
#[derive(Debug, Clone)]
pub struct IpfsClient {
    base: Url,
    pipeline: CommandPipeline,
    subsystems: Arc<Subsystems>,
}

impl IpfsClient {
    /// Client for a daemon on the default local address,
    /// `http://127.0.0.1:5001/api/v0`.
    pub fn local() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }

    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = config.base_uri()?;
        let http_client = config.build_http_client()?;
        Self::with_http_client(base, http_client)
    }

    /// Builds a client around an existing transport. `base` is the command
    /// endpoint, e.g. `http://127.0.0.1:5001/api/v0`.
    pub fn with_http_client(base: Url, http_client: reqwest::Client) -> Result<Self> {
        let pipeline = CommandPipeline::new(http_client);
        let subsystems = Arc::new(Subsystems::new(&base, &pipeline)?);
        Ok(Self {
            base,
            pipeline,
            subsystems,
        })
    }

    pub fn base_uri(&self) -> &Url {
        &self.base
    }

    /// Root commands (`add`, `cat`, `ls`, ...).
    pub fn root(&self) -> &Subsystem {
        &self.subsystems.root
    }

    /// Releases the transport. Only the first call has an effect and
    /// returns `true`.
    pub fn release(&self) -> bool {
        self.pipeline.release()
    }

    pub fn is_released(&self) -> bool {
        self.pipeline.is_released()
    }

    /// Runs an arbitrary command below the API root, e.g. `"diag/net"`.
    pub async fn execute(
        &self,
        request: CommandRequest,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        self.root().execute(request, cancel).await
    }

    /// Lists all commands the daemon knows, as raw JSON.
    pub async fn commands(&self, cancel: &CancellationToken) -> Result<ResponseBody> {
        self.execute(CommandRequest::new("commands"), cancel).await
    }

    pub async fn version(&self, cancel: &CancellationToken) -> Result<VersionInfo> {
        self.execute(CommandRequest::new("version"), cancel)
            .await?
            .json()
            .await
    }

    /// Identity of `peer_id`, or of the local node when `None`.
    pub async fn id(&self, peer_id: Option<&str>, cancel: &CancellationToken) -> Result<PeerInfo> {
        let request = CommandRequest::new("id").args(peer_id);
        self.execute(request, cancel).await?.json().await
    }

    /// Lists the links of the object at `path`, as raw JSON.
    pub async fn ls(&self, path: &str, cancel: &CancellationToken) -> Result<ResponseBody> {
        self.execute(CommandRequest::new("ls").arg(path), cancel)
            .await
    }

    /// Content of the object at `path`; read it with
    /// [`ResponseBody::into_stream`] or [`ResponseBody::into_reader`].
    pub async fn cat(&self, path: &str, cancel: &CancellationToken) -> Result<ResponseBody> {
        self.execute(CommandRequest::new("cat").arg(path), cancel)
            .await
    }

    /// Streams `payload` to the daemon and returns the identifier it was
    /// stored under.
    pub async fn add(&self, payload: NamedStream, cancel: &CancellationToken) -> Result<AddedObject> {
        self.execute(CommandRequest::new("add").upload(payload), cancel)
            .await?
            .json()
            .await
    }

    /// Asks the daemon to exit. The daemon may drop the connection before
    /// answering, so callers should not rely on the result.
    pub async fn shutdown(&self, cancel: &CancellationToken) -> Result<()> {
        self.execute(CommandRequest::new("shutdown"), cancel)
            .await?;
        Ok(())
    }
}

// Models

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct VersionInfo {
    pub version: String,
    pub commit: String,
    pub repo: String,
    pub system: String,
    pub golang: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct PeerInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub public_key: String,
    pub addresses: Option<Vec<MultiAddr>>,
    pub agent_version: String,
    pub protocol_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddedObject {
    #[serde(default)]
    pub name: String,
    pub hash: MultiHash,
    #[serde(default)]
    pub size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_subsystem_uris() {
        let client = IpfsClient::local().unwrap();
        assert_eq!(client.base_uri().as_str(), "http://127.0.0.1:5001/api/v0");
        assert_eq!(client.root().base_uri(), client.base_uri());
        assert_eq!(
            client.pin().base_uri().as_str(),
            "http://127.0.0.1:5001/api/v0/pin"
        );
        assert_eq!(
            client.diag().uri(&CommandRequest::new("net")).unwrap().as_str(),
            "http://127.0.0.1:5001/api/v0/diag/net"
        );
        assert_eq!(client.bitswap().name(), "bitswap");
    }

    #[test]
    fn test_release_shared_between_clones() {
        let client = IpfsClient::local().unwrap();
        let other = client.clone();
        assert!(other.release());
        assert!(client.is_released());
        assert!(!client.release());
    }

    #[tokio::test]
    async fn test_subsystem_fails_after_release() {
        let client = IpfsClient::local().unwrap();
        let swarm = client.swarm().clone();
        client.release();
        let cancel = CancellationToken::new();
        let err = swarm
            .execute(CommandRequest::new("peers"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_released());
        let err = client.version(&cancel).await.unwrap_err();
        assert!(err.is_released());
    }

    #[test]
    fn test_models_tolerate_missing_fields() {
        let version: VersionInfo = serde_json::from_str(r#"{"Version":"0.4.0"}"#).unwrap();
        assert_eq!(version.version, "0.4.0");
        assert_eq!(version.commit, "");

        let peer: PeerInfo = serde_json::from_str(
            r#"{"ID":"QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ","Addresses":null}"#,
        )
        .unwrap();
        assert_eq!(peer.id, "QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ");
        assert!(peer.addresses.is_none());

        let added: AddedObject = serde_json::from_str(
            r#"{"Name":"a.txt","Hash":"QmPXME1oRtoT627YKaDPDQ3PwA8tdP9rWuAAweLzqSwAWT"}"#,
        )
        .unwrap();
        assert_eq!(added.hash.digest_size(), 32);
        assert_eq!(added.size, None);
    }
}
