use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ipfs_api::{CancellationToken, CommandRequest, IpfsClient, NamedStream};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::helpers;

pub mod hash;

pub async fn run_command(
    config_file: PathBuf,
    api: Option<String>,
    cmd: crate::Commands,
) -> Result<()> {
    match cmd {
        crate::Commands::Config { cmd } => cmd.run(&config_file),
        crate::Commands::Hash { cmd } => hash::run_hash(cmd),
        cmd => {
            let config = helpers::load_config(&config_file, api)?;
            let client = IpfsClient::new(&config).context("failed to create client")?;
            debug!("using daemon at {}", client.base_uri());

            let cancel = CancellationToken::new();
            helpers::cancel_on_ctrl_c(cancel.clone());

            let res = run_daemon_command(&client, cmd, &cancel).await;
            client.release();
            match res {
                Err(err) if is_cancelled(&err) => anyhow::bail!("interrupted"),
                res => res,
            }
        }
    }
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ipfs_api::Error>()
        .is_some_and(ipfs_api::Error::is_cancelled)
}

async fn run_daemon_command(
    client: &IpfsClient,
    cmd: crate::Commands,
    cancel: &CancellationToken,
) -> Result<()> {
    match cmd {
        crate::Commands::Version => {
            let version = client.version(cancel).await?;
            println!("version: {}", version.version);
            if !version.commit.is_empty() {
                println!("commit:  {}", version.commit);
            }
            if !version.repo.is_empty() {
                println!("repo:    {}", version.repo);
            }
            if !version.system.is_empty() {
                println!("system:  {}", version.system);
            }
        }
        crate::Commands::Commands => {
            let text = client.commands(cancel).await?.text().await?;
            println!("{text}");
        }
        crate::Commands::Cat { path, out } => {
            let body = client.cat(&path, cancel).await?;
            let mut reader = body.into_reader();
            match out {
                Some(out) => {
                    let mut file = tokio::fs::File::create(&out)
                        .await
                        .with_context(|| format!("failed to create {}", out.display()))?;
                    let written = tokio::io::copy(&mut reader, &mut file)
                        .await
                        .map_err(io_error)?;
                    file.flush().await?;
                    info!("wrote {written} bytes to {out:?}");
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    tokio::io::copy(&mut reader, &mut stdout)
                        .await
                        .map_err(io_error)?;
                    stdout.flush().await?;
                }
            }
        }
        crate::Commands::Add { file } => {
            let added = add_file(client, &file, cancel).await?;
            println!("added {} {}", added.hash, added.name);
        }
        crate::Commands::Raw {
            method,
            args,
            flags,
        } => {
            let mut request = CommandRequest::new(method).args(args);
            for (name, value) in flags {
                request = request.flag(name, value);
            }
            let text = client.execute(request, cancel).await?.text().await?;
            println!("{text}");
        }
        crate::Commands::Config { .. } | crate::Commands::Hash { .. } => {
            anyhow::bail!("not a daemon command")
        }
    }
    Ok(())
}

async fn add_file(
    client: &IpfsClient,
    file: &Path,
    cancel: &CancellationToken,
) -> Result<ipfs_api::client::AddedObject> {
    let payload = NamedStream::open(file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;
    info!(
        "uploading {} ({} bytes)",
        payload.file_name,
        payload.length().unwrap_or_default()
    );
    Ok(client.add(payload, cancel).await?)
}

/// The reader wraps pipeline errors in `io::Error`; surface cancellation
/// as such instead of as an I/O failure.
fn io_error(err: std::io::Error) -> anyhow::Error {
    let cancelled = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<ipfs_api::Error>())
        .is_some_and(ipfs_api::Error::is_cancelled);
    if cancelled {
        ipfs_api::Error::Cancelled.into()
    } else {
        err.into()
    }
}
