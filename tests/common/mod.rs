// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use aptblob::signing::{self, SignFailure};
use aptblob::{Digests, HashAlgorithm};
use flate2::write::GzEncoder;
use flate2::Compression;
use openpgp::cert::CertBuilder;
use openpgp::policy::StandardPolicy;
use openpgp::serialize::stream::{Message, Signer};
use sequoia_openpgp as openpgp;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build a minimal `.deb` whose control file is `control`
pub fn build_deb(control: &str) -> Vec<u8> {
    let mut control_tar = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(control.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    control_tar
        .append_data(&mut header, "./control", control.as_bytes())
        .unwrap();
    let control_tar = gzip(&control_tar.into_inner().unwrap());

    let members: [(&str, &[u8]); 3] = [
        ("debian-binary", b"2.0\n"),
        ("control.tar.gz", &control_tar),
        ("data.tar.gz", &[]),
    ];
    let mut buf = Vec::new();
    {
        let mut builder = ar::Builder::new(&mut buf);
        for (name, data) in members {
            let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
            builder.append(&header, data).unwrap();
        }
    }
    buf
}

/// Write a `.deb` for `package` into `dir` and return its path
pub fn write_deb(dir: &Path, package: &str, version: &str, arch: &str) -> PathBuf {
    let control = format!(
        "Package: {}\nVersion: {}\nArchitecture: {}\nMaintainer: Test <test@example.com>\nDescription: test package\n  Longer description.\n",
        package, version, arch
    );
    let path = dir.join(format!("{}_{}_{}.deb", package, version, arch));
    fs::write(&path, build_deb(&control)).unwrap();
    path
}

/// Write a native source package (`.dsc` plus tarball) into `dir` and
/// return the `.dsc` path
pub fn write_dsc(dir: &Path, source: &str, version: &str) -> PathBuf {
    let stem = format!("{}_{}", source, version);
    let tarball = format!("{}.tar.xz", stem);
    let contents = format!("{} {} sources", source, version);
    fs::write(dir.join(&tarball), &contents).unwrap();

    let digests = Digests::of(contents.as_bytes());
    let dsc = format!(
        "Format: 3.0 (native)\nSource: {source}\nBinary: {source}\nVersion: {version}\nFiles:\n {} {} {tarball}\n",
        digests.hex(HashAlgorithm::Md5),
        digests.size,
    );
    let dsc = clearsign(dsc.as_bytes());
    let path = dir.join(format!("{}.dsc", stem));
    fs::write(&path, dsc).unwrap();
    path
}

/// Clear-sign `text` with a freshly generated key
pub fn clearsign(text: &[u8]) -> Vec<u8> {
    let (cert, _) = CertBuilder::general_purpose(None, Some("maintainer@example.org"))
        .generate()
        .unwrap();
    let policy = StandardPolicy::new();
    let keypair = cert
        .keys()
        .unencrypted_secret()
        .with_policy(&policy, None)
        .for_signing()
        .next()
        .unwrap()
        .key()
        .clone()
        .into_keypair()
        .unwrap();

    let mut out = Vec::new();
    let message = Message::new(&mut out);
    let mut signer = Signer::new(message, keypair).cleartext().build().unwrap();
    signer.write_all(text).unwrap();
    signer.finalize().unwrap();
    out
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Signer that wraps the data in fixed markers instead of running gpg
pub struct FakeSigner;

impl signing::Signer for FakeSigner {
    fn clear_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure> {
        Ok([b"-----BEGIN FAKE SIGNED MESSAGE-----\n".as_slice(), data].concat())
    }

    fn detach_sign(&self, data: &[u8]) -> Result<Vec<u8>, SignFailure> {
        Ok(format!("-----FAKE SIGNATURE {}-----\n", data.len()).into_bytes())
    }
}
