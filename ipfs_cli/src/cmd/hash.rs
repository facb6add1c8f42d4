use std::fmt::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use ipfs_core::MultiHash;

use crate::helpers;

#[derive(Subcommand)]
pub enum HashCmd {
    /// Build a multihash from a function code and a hex digest
    Encode {
        /// Hash function code, e.g. 0x12 for sha2-256
        #[arg(long, value_parser = helpers::parse_function_code)]
        code: u8,
        /// Digest bytes as hex
        digest: String,
    },
    /// Print the parts of a base58 multihash
    Decode {
        /// Base58btc text, e.g. QmPXME1oRtoT627YKaDPDQ3PwA8tdP9rWuAAweLzqSwAWT
        text: String,
    },
}

pub fn run_hash(cmd: HashCmd) -> Result<()> {
    match cmd {
        HashCmd::Encode { code, digest } => {
            let digest = helpers::parse_digest_hex(&digest)?;
            let hash = MultiHash::new(code, &digest);
            println!("{hash}");
        }
        HashCmd::Decode { text } => {
            let hash: MultiHash = text
                .parse()
                .with_context(|| format!("'{text}' is not a valid multihash"))?;
            print!("{}", describe(&hash));
        }
    }
    Ok(())
}

fn describe(hash: &MultiHash) -> String {
    let mut out = String::new();
    let function = match hash.hash_function() {
        Some(function) => format!("{function:?}"),
        None => "unknown".to_owned(),
    };
    let _ = writeln!(out, "function:    0x{:02x} ({function})", hash.function_code());
    let _ = writeln!(out, "digest size: {}", hash.digest_size());
    let _ = writeln!(out, "digest:      {}", hex::encode(hash.digest()));
    if !hash.is_well_formed() {
        let _ = writeln!(
            out,
            "warning:     declared size {} but digest has {} bytes",
            hash.digest_size(),
            hash.digest().len()
        );
    }
    out
}
