use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MultiAddrError {
    #[error("multiaddr must start with '/': {0:?}")]
    MissingLeadingSlash(String),
}

/// Network address descriptor such as
/// `/ip4/104.131.131.82/tcp/4001/ipfs/QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ`.
///
/// The string is carried as-is; the client never interprets the protocol
/// stack, it only passes it to the daemon as a command argument or reads it
/// back out of decoded responses.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MultiAddr(String);

impl MultiAddr {
    pub fn parse(s: &str) -> Result<Self, MultiAddrError> {
        if !s.starts_with('/') {
            return Err(MultiAddrError::MissingLeadingSlash(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty `/`-separated components, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl AsRef<str> for MultiAddr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MultiAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MultiAddr {
    type Err = MultiAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MultiAddr::parse(s)
    }
}

impl From<MultiAddr> for String {
    fn from(value: MultiAddr) -> Self {
        value.0
    }
}

impl Serialize for MultiAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MultiAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MultiAddr::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAP: &str =
        "/ip4/104.131.131.82/tcp/4001/ipfs/QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ";

    #[test]
    fn test_multiaddr_keeps_input_string() {
        let addr: MultiAddr = BOOTSTRAP.parse().unwrap();
        assert_eq!(addr.as_str(), BOOTSTRAP);
        assert_eq!(addr.to_string(), BOOTSTRAP);
    }

    #[test]
    fn test_multiaddr_segments() {
        let addr = MultiAddr::parse(BOOTSTRAP).unwrap();
        let segments: Vec<&str> = addr.segments().collect();
        assert_eq!(
            segments,
            vec![
                "ip4",
                "104.131.131.82",
                "tcp",
                "4001",
                "ipfs",
                "QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ"
            ]
        );
    }

    #[test]
    fn test_multiaddr_requires_leading_slash() {
        assert_eq!(
            MultiAddr::parse("ip4/127.0.0.1"),
            Err(MultiAddrError::MissingLeadingSlash("ip4/127.0.0.1".into()))
        );
    }

    #[test]
    fn test_multiaddr_serde() {
        let addr = MultiAddr::parse("/ip4/127.0.0.1/tcp/4001").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"/ip4/127.0.0.1/tcp/4001\"");
        let back: MultiAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<MultiAddr>("\"tcp\"").is_err());
    }
}
