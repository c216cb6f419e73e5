// src/commands/mod.rs
//! Command handlers for the aptblob CLI

mod init;
mod upload;

pub use init::cmd_init;
pub use upload::cmd_upload;

use anyhow::{Context, Result};
use aptblob::config::Config;
use aptblob::signing::{GpgSigner, Signer};
use aptblob::storage::{self, BlobStore};
use aptblob::{Distribution, Repository};

/// Open the bucket named on the command line
fn open_bucket(bucket: &str) -> Result<Box<dyn BlobStore>> {
    storage::open(bucket).with_context(|| format!("open bucket {}", bucket))
}

/// Repository handle for `dist` using the configured field types
fn repository<'a>(
    store: &'a dyn BlobStore,
    dist: &str,
    config: &Config,
    signer: Option<&'a GpgSigner>,
) -> Result<Repository<'a>> {
    let dist = Distribution::new(dist).with_context(|| format!("invalid distribution {:?}", dist))?;
    Ok(Repository::new(store, dist)
        .with_fields(config.field_profiles())
        .with_signer(signer.map(|s| s as &dyn Signer)))
}
