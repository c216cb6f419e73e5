// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: bucket location
fn bucket_arg() -> Arg {
    Arg::new("bucket")
        .required(true)
        .help("Bucket URL (file:///path) or local directory")
}

/// Common argument: distribution name
fn dist_arg() -> Arg {
    Arg::new("dist")
        .required(true)
        .help("Distribution name, e.g. stable")
}

fn build_cli() -> Command {
    Command::new("aptblob")
        .version(env!("CARGO_PKG_VERSION"))
        .author("aptblob Contributors")
        .about("Manager for APT repositories stored in blob storage")
        .subcommand_required(true)
        .arg(
            Arg::new("key_id")
                .short('k')
                .long("keyid")
                .value_name("KEYID")
                .global(true)
                .help("GPG key to sign Release files with (InRelease and Release.gpg)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug output"),
        )
        .subcommand(
            Command::new("init")
                .about("Set up a distribution from a Release template read on stdin")
                .arg(bucket_arg())
                .arg(dist_arg()),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload binary (.deb) and source (.dsc) packages")
                .arg(
                    Arg::new("component")
                        .short('c')
                        .long("component")
                        .help("Component to publish into [default: main]"),
                )
                .arg(bucket_arg())
                .arg(dist_arg())
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .value_name("PACKAGE")
                        .help("Package files"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("aptblob.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
