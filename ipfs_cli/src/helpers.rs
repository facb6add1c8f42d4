use anyhow::{Context, Result, anyhow};
use ipfs_api::{CancellationToken, ClientConfig};
use std::path::Path;
use tracing::{debug, info};

/// Loads the client config, falling back to defaults when the file does
/// not exist. `api` overrides the configured daemon address.
pub fn load_config(config_file: &Path, api: Option<String>) -> Result<ClientConfig> {
    let mut config = if config_file.exists() {
        let toml_content = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read {}", config_file.display()))?;
        toml::from_str(&toml_content)
            .with_context(|| format!("could not parse client config file {}", config_file.display()))?
    } else {
        debug!("no config file at {config_file:?}, using defaults");
        ClientConfig::default()
    };
    if let Some(api) = api {
        config.api_url = api;
    }
    Ok(config)
}

/// Parses `NAME=VALUE`; the value may itself contain `=`.
pub fn parse_flag(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("empty flag name in '{s}'"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

/// Parses a multihash function code given as `0x12` or `18`.
pub fn parse_function_code(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid function code '{s}': {e}"))
}

pub fn parse_digest_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim()).map_err(|e| anyhow!("failed to decode hex digest: {e}"))
}

/// Cancels `cancel` on the first Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling command");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(
            parse_flag("timeout=1").unwrap(),
            ("timeout".to_owned(), "1".to_owned())
        );
        assert_eq!(
            parse_flag("format=<src>=<dst>").unwrap(),
            ("format".to_owned(), "<src>=<dst>".to_owned())
        );
        assert_eq!(
            parse_flag("empty=").unwrap(),
            ("empty".to_owned(), String::new())
        );
        assert!(parse_flag("novalue").is_err());
        assert!(parse_flag("=x").is_err());
    }

    #[test]
    fn test_parse_function_code() {
        assert_eq!(parse_function_code("0x12"), Ok(0x12));
        assert_eq!(parse_function_code("0X1e"), Ok(0x1e));
        assert_eq!(parse_function_code("18"), Ok(18));
        assert!(parse_function_code("0x100").is_err());
        assert!(parse_function_code("sha2").is_err());
    }

    #[test]
    fn test_parse_digest_hex() {
        assert_eq!(parse_digest_hex("abcd").unwrap(), vec![0xab, 0xcd]);
        assert!(parse_digest_hex("abc").is_err());
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("client.toml"), None).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_config_file_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            "api_url = \"http://10.0.0.2:5001\"\ntimeout_secs = 5\n\n[headers]\nauthorization = \"Basic abc\"\n",
        )
        .unwrap();

        let config = load_config(&path, None).unwrap();
        assert_eq!(config.api_url, "http://10.0.0.2:5001");
        assert_eq!(config.api_path, "api/v0");
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.headers.get("authorization").unwrap(), "Basic abc");

        let config = load_config(&path, Some("http://127.0.0.1:9999".into())).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9999");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "api_url = [").unwrap();
        assert!(load_config(&path, None).is_err());
    }
}
