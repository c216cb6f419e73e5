// src/cli/mod.rs
//! CLI definitions for aptblob
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Commands:
//! - `init` - Create or update a distribution's Release file
//! - `upload` - Upload `.deb` and `.dsc` packages and republish indices

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aptblob")]
#[command(author, version)]
#[command(about = "Manager for APT repositories stored in blob storage", long_about = None)]
pub struct Cli {
    /// GPG key to sign Release files with (InRelease and Release.gpg)
    #[arg(short = 'k', long = "keyid", global = true, value_name = "KEYID")]
    pub key_id: Option<String>,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up a distribution from a Release template read on stdin
    ///
    /// Checksum lists already in the bucket's Release file are kept.
    Init {
        /// Bucket URL (file:///path) or local directory
        bucket: String,

        /// Distribution name, e.g. stable
        dist: String,
    },

    /// Upload binary (.deb) and source (.dsc) packages
    Upload {
        /// Component to publish into [default: main]
        #[arg(short, long)]
        component: Option<String>,

        /// Bucket URL (file:///path) or local directory
        bucket: String,

        /// Distribution name, e.g. stable
        dist: String,

        /// Package files
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<PathBuf>,
    },
}
