use std::{fs, io::Write, path::Path};

use anyhow::Context;
use clap::Subcommand;
use ipfs_api::config::{DEFAULT_API_PATH, DEFAULT_API_URL};
use toml_edit::{DocumentMut, Item, Table};
use tracing::info;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the client config file if it doesn't exist, keeping existing values
    Init {
        /// Daemon address to store, replacing the current one
        #[arg(long, value_name = "URL")]
        api: Option<String>,
    },
}

impl CmdConfig {
    pub fn run(self, config_file: &Path) -> anyhow::Result<()> {
        let mut doc = if config_file.exists() {
            fs::read_to_string(config_file)?
        } else {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            String::new()
        }
        .parse::<DocumentMut>()
        .context("could not parse client config file")?;

        match self {
            Self::Init { api } => {
                if let Some(api) = api {
                    doc["api_url"] = toml_edit::value(api);
                } else if !doc.contains_key("api_url") {
                    doc["api_url"] = toml_edit::value(DEFAULT_API_URL);
                }
                if !doc.contains_key("api_path") {
                    doc["api_path"] = toml_edit::value(DEFAULT_API_PATH);
                }
                doc.entry("headers").or_insert(Item::Table(Table::new()));
            }
        }

        info!("writing to config file {config_file:?}");

        let tmp_path = config_file.with_extension("tmp");
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, config_file)?;
        Ok(())
    }
}
