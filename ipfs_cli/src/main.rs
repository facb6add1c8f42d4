use crate::cmd::hash::HashCmd;
use crate::init_config::CmdConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;
use std::path::PathBuf;

mod cmd;
mod helpers;
mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// daemon address, overrides `api_url` from the config file
    #[arg(long, value_name = "URL")]
    api: Option<String>,

    /// config file to use instead of the platform default
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modify the client config
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// Show the daemon version
    Version,
    /// List all commands the daemon supports (raw JSON)
    Commands,
    /// Print the content of an object
    Cat {
        /// Object path or base58 multihash
        path: String,
        /// Write to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Stream a local file to the daemon and print its identifier
    Add {
        /// Local file path to upload
        file: PathBuf,
    },
    /// Run an arbitrary command and print the response body
    Raw {
        /// Command path below the API root, e.g. "swarm/peers"
        method: String,
        /// Positional argument, repeatable; order is kept
        #[arg(long = "arg", value_name = "VALUE")]
        args: Vec<String>,
        /// Named flag as NAME=VALUE, repeatable
        #[arg(long = "flag", value_name = "NAME=VALUE", value_parser = helpers::parse_flag)]
        flags: Vec<(String, String)>,
    },
    /// Inspect or build multihash identifiers (no daemon needed)
    Hash {
        #[command(subcommand)]
        cmd: HashCmd,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    // Config lives under the platform config dir, e.g. ~/.config/ipfs-api/client.toml
    let config_file = match cli.config {
        Some(path) => path,
        None => ProjectDirs::from("", "", "ipfs-api")
            .context("failed to determine config directory path")?
            .config_dir()
            .join("client.toml"),
    };

    cmd::run_command(config_file, cli.api, cli.cmd).await
}
