// src/commands/init.rs

//! Distribution setup

use super::{open_bucket, repository};
use anyhow::{Context, Result};
use aptblob::config::Config;
use aptblob::control;
use std::io::{self, Read};
use tracing::info;

/// Publish a Release file built from the template on stdin
pub fn cmd_init(bucket: &str, dist: &str, config: &Config, key_id: Option<&str>) -> Result<()> {
    eprintln!("aptblob: reading Release from stdin...");
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("read stdin")?;
    let profiles = config.field_profiles();
    let template = control::parse_single(&input, &profiles.release).context("parse Release template")?;

    let store = open_bucket(bucket)?;
    let signer = config.signer(key_id);
    let repo = repository(store.as_ref(), dist, config, signer.as_ref())?;
    info!("Initializing {} in {} bucket {}", dist, store.name(), bucket);

    let release = repo.init_distribution(template)?;

    println!("Initialized distribution {}", dist);
    println!("  Release fields: {}", release.len());
    match &signer {
        Some(signer) => println!("  Signed with: {}", signer.key_id()),
        None => println!("  Unsigned (no --keyid)"),
    }
    Ok(())
}
