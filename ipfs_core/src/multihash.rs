//! Self-describing content hashes as used by the IPFS daemon.
//!
//! The binary form is `function_code || digest_size || digest` and the text
//! form is the unprefixed base58 (bitcoin alphabet) encoding of those bytes,
//! e.g. `QmPXME1oRtoT627YKaDPDQ3PwA8tdP9rWuAAweLzqSwAWT`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const TEXT_BASE: multibase::Base = multibase::Base::Base58Btc;

/// Smallest valid binary form: function code and digest size.
pub const MIN_LEN: usize = 2;

#[derive(thiserror::Error, Debug)]
pub enum MultiHashError {
    #[error("invalid base58 string: {0}")]
    Base58(#[from] multibase::Error),
    #[error("invalid length: expected at least {MIN_LEN} bytes, got {0}")]
    TooShort(usize),
    #[error("digest length mismatch: header declares {declared} bytes, got {actual}")]
    DigestLengthMismatch { declared: u8, actual: usize },
}

/// Well-known multihash function codes.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum HashFunction {
    Sha1 = 0x11,
    Sha2_256 = 0x12,
    Sha2_512 = 0x13,
    Blake3 = 0x1e,
}

impl HashFunction {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x11 => Some(Self::Sha1),
            0x12 => Some(Self::Sha2_256),
            0x13 => Some(Self::Sha2_512),
            0x1e => Some(Self::Blake3),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Content identifier: a digest tagged with the hash function that produced
/// it and the digest's declared length.
///
/// Equality, ordering and hashing all operate on the canonical binary form,
/// so two values are equal iff they encode to the same bytes.
///
/// Decoding from bytes is lenient: everything after the two header bytes is
/// taken as the digest, whether or not its length matches the declared
/// size. Use [`MultiHash::from_bytes_strict`] to reject such inputs.
///
/// ```
/// use ipfs_core::MultiHash;
///
/// let id: MultiHash = "QmPXME1oRtoT627YKaDPDQ3PwA8tdP9rWuAAweLzqSwAWT".parse().unwrap();
/// assert_eq!(id.function_code(), 0x12);
/// assert_eq!(id.digest_size(), 32);
/// assert_eq!(id.to_string(), "QmPXME1oRtoT627YKaDPDQ3PwA8tdP9rWuAAweLzqSwAWT");
/// ```
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MultiHash {
    bytes: Vec<u8>,
}

impl fmt::Debug for MultiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiHash")
            .field("function_code", &format_args!("{:#04x}", self.function_code()))
            .field("digest_size", &self.digest_size())
            .field("digest", &data_encoding::HEXLOWER.encode(self.digest()))
            .finish()
    }
}

impl MultiHash {
    /// Assembles an identifier, deriving the size byte from the digest.
    /// Digests longer than 255 bytes record a size of 255.
    pub fn new(function_code: u8, digest: &[u8]) -> Self {
        let digest_size = u8::try_from(digest.len()).unwrap_or(u8::MAX);
        Self::from_parts(function_code, digest_size, digest)
    }

    /// Assembles an identifier from its three fields exactly as given.
    pub fn from_parts(function_code: u8, digest_size: u8, digest: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(MIN_LEN + digest.len());
        bytes.push(function_code);
        bytes.push(digest_size);
        bytes.extend_from_slice(digest);
        Self { bytes }
    }

    /// Hashes `data` with BLAKE3 and tags the digest with code `0x1e`.
    pub fn blake3(data: impl AsRef<[u8]>) -> Self {
        let hash = blake3::hash(data.as_ref());
        Self::new(HashFunction::Blake3.code(), hash.as_bytes())
    }

    /// Decodes the canonical binary form.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, MultiHashError> {
        let bytes = bytes.into();
        if bytes.len() < MIN_LEN {
            return Err(MultiHashError::TooShort(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// Like [`MultiHash::from_bytes`], but also requires the digest length to
    /// equal the declared size.
    pub fn from_bytes_strict(bytes: impl Into<Vec<u8>>) -> Result<Self, MultiHashError> {
        let hash = Self::from_bytes(bytes)?;
        if !hash.is_well_formed() {
            return Err(MultiHashError::DigestLengthMismatch {
                declared: hash.digest_size(),
                actual: hash.digest().len(),
            });
        }
        Ok(hash)
    }

    /// Decodes the base58 text form.
    pub fn parse(text: &str) -> Result<Self, MultiHashError> {
        let bytes = TEXT_BASE.decode(text)?;
        Self::from_bytes(bytes)
    }

    pub fn function_code(&self) -> u8 {
        self.bytes[0]
    }

    pub fn hash_function(&self) -> Option<HashFunction> {
        HashFunction::from_code(self.function_code())
    }

    pub fn digest_size(&self) -> u8 {
        self.bytes[1]
    }

    pub fn digest(&self) -> &[u8] {
        &self.bytes[MIN_LEN..]
    }

    /// True when the digest length matches the declared digest size.
    pub fn is_well_formed(&self) -> bool {
        self.digest().len() == usize::from(self.digest_size())
    }

    /// The canonical binary form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The canonical base58 text form.
    pub fn to_base58(&self) -> String {
        TEXT_BASE.encode(&self.bytes)
    }

    /// First 5 digest bytes as hex, for log lines.
    pub fn fmt_short(&self) -> String {
        let digest = self.digest();
        data_encoding::HEXLOWER.encode(&digest[..digest.len().min(5)])
    }
}

impl AsRef<[u8]> for MultiHash {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl TryFrom<&[u8]> for MultiHash {
    type Error = MultiHashError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl TryFrom<Vec<u8>> for MultiHash {
    type Error = MultiHashError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl From<MultiHash> for Vec<u8> {
    fn from(value: MultiHash) -> Self {
        value.bytes
    }
}

impl fmt::Display for MultiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for MultiHash {
    type Err = MultiHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MultiHash::parse(s)
    }
}

impl Serialize for MultiHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for MultiHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Base58Visitor;

        impl Visitor<'_> for Base58Visitor {
            type Value = MultiHash;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a base58 encoded multihash string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                MultiHash::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Base58Visitor)
    }
}
