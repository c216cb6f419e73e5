// src/commands/upload.rs

//! Package upload

use super::{open_bucket, repository};
use anyhow::{Context, Result};
use aptblob::config::Config;
use std::path::PathBuf;
use tracing::info;

/// Upload packages into a component and republish its indices
pub fn cmd_upload(
    bucket: &str,
    dist: &str,
    component: Option<&str>,
    packages: &[PathBuf],
    config: &Config,
    key_id: Option<&str>,
) -> Result<()> {
    let store = open_bucket(bucket)?;
    let signer = config.signer(key_id);
    let repo = repository(store.as_ref(), dist, config, signer.as_ref())?;
    let component_name = component.unwrap_or(&config.upload.component);
    let component = repo
        .dist()
        .component(component_name)
        .with_context(|| format!("invalid component {:?}", component_name))?;
    info!(
        "Uploading {} package(s) to {}/{} in {} bucket {}",
        packages.len(),
        dist,
        component.name(),
        store.name(),
        bucket
    );

    let summary = repo.upload_packages(&component, packages)?;

    println!(
        "Uploaded {} binary and {} source package(s) to {}/{}",
        summary.binary_packages,
        summary.source_packages,
        dist,
        component.name()
    );
    for index in &summary.indices {
        println!("  Updated {}", index);
    }
    if signer.is_none() {
        println!("  Release left unsigned (no --keyid)");
    }
    Ok(())
}
