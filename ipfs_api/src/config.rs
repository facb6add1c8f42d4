use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result, uri};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_API_PATH: &str = "api/v0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Daemon address, e.g. `http://127.0.0.1:5001`
    pub api_url: String,
    /// Path of the command API below `api_url`
    pub api_path: String,
    /// Whole-request timeout; unset means no timeout
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            api_path: DEFAULT_API_PATH.to_owned(),
            timeout_secs: None,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The command endpoint, `api_url` + `api_path`.
    pub fn base_uri(&self) -> Result<Url> {
        let api_url = Url::parse(&self.api_url)?;
        Ok(uri::append_path(&api_url, &self.api_path)?)
    }

    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(format!("name '{name}'")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| Error::InvalidHeader(format!("value for '{name}'")))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_uri() {
        let config = ClientConfig::default();
        assert_eq!(
            config.base_uri().unwrap().as_str(),
            "http://127.0.0.1:5001/api/v0"
        );
    }

    #[test]
    fn test_base_uri_slash_variants() {
        let config = ClientConfig {
            api_url: "http://localhost:5002/".into(),
            api_path: "/api/v0/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.base_uri().unwrap().as_str(),
            "http://localhost:5002/api/v0"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let config = ClientConfig::default().with_api_url("not a url");
        assert!(matches!(config.base_uri(), Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 30}"#).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_path, DEFAULT_API_PATH);
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut config = ClientConfig::default();
        config
            .headers
            .insert("bad header".into(), "value".into());
        assert!(matches!(
            config.build_http_client(),
            Err(Error::InvalidHeader(_))
        ));

        let mut config = ClientConfig::default();
        config
            .headers
            .insert("authorization".into(), "Basic abc".into());
        assert!(config.build_http_client().is_ok());
    }
}
