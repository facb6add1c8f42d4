use tokio_util::sync::CancellationToken;
use url::Url;

use crate::command::CommandRequest;
use crate::pipeline::CommandPipeline;
use crate::response::ResponseBody;
use crate::{Result, uri};

/// Handle for one group of daemon commands (`pin`, `swarm`, `dht`, ...),
/// bound to that group's base URI and the client's shared pipeline.
#[derive(Debug, Clone)]
pub struct Subsystem {
    name: &'static str,
    base: Url,
    pipeline: CommandPipeline,
}

impl Subsystem {
    pub(crate) fn new(
        name: &'static str,
        api_base: &Url,
        pipeline: CommandPipeline,
    ) -> Result<Self> {
        Ok(Self {
            name,
            base: uri::append_path(api_base, name)?,
            pipeline,
        })
    }

    /// Subsystem name, empty for the root commands.
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn base_uri(&self) -> &Url {
        &self.base
    }

    /// The URI `request` would be sent to.
    pub fn uri(&self, request: &CommandRequest) -> Result<Url> {
        Ok(uri::build_uri(
            &self.base,
            request.method(),
            request.arg_values(),
            request.raw_flags(),
        )?)
    }

    pub async fn execute(
        &self,
        request: CommandRequest,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody> {
        self.pipeline.execute(&self.base, request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_uri() {
        let api = Url::parse("http://127.0.0.1:5001/api/v0").unwrap();
        let pipeline = CommandPipeline::new(reqwest::Client::new());
        let swarm = Subsystem::new("swarm", &api, pipeline.clone()).unwrap();
        assert_eq!(swarm.name(), "swarm");
        assert_eq!(
            swarm.base_uri().as_str(),
            "http://127.0.0.1:5001/api/v0/swarm"
        );

        let request = CommandRequest::new("connect")
            .arg("/ip4/104.131.131.82/tcp/4001/ipfs/QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ");
        let uri = swarm.uri(&request).unwrap();
        assert_eq!(uri.path(), "/api/v0/swarm/connect");
        assert_eq!(
            uri.query(),
            Some("arg=%2Fip4%2F104.131.131.82%2Ftcp%2F4001%2Fipfs%2FQmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ")
        );
        let (key, value) = uri.query_pairs().next().unwrap();
        assert_eq!(key, "arg");
        assert_eq!(
            value,
            "/ip4/104.131.131.82/tcp/4001/ipfs/QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ"
        );

        let root = Subsystem::new("", &api, pipeline).unwrap();
        assert_eq!(root.base_uri(), &api);
    }
}
