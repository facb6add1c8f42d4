//! Value types shared by the IPFS HTTP API client.
//!
//! ## Wire-stable types
//!
//! - Content identifiers (`multihash::MultiHash`): the key space of the
//!   daemon. Binary form `function_code || digest_size || digest`, text
//!   form base58.
//! - Address descriptors (`multiaddr::MultiAddr`): opaque slash-delimited
//!   protocol stacks, passed through untouched.
//!
//! Neither type performs I/O; the request pipeline lives in `ipfs_api`.

pub mod multiaddr;
pub mod multihash;

pub use multiaddr::{MultiAddr, MultiAddrError};
pub use multihash::{HashFunction, MultiHash, MultiHashError};
