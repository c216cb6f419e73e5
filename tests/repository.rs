// tests/repository.rs

//! End-to-end repository updates against in-memory and on-disk buckets.

mod common;

use aptblob::control::{parse_paragraphs, parse_single};
use aptblob::release::{parse_index_signatures, parse_release};
use aptblob::storage::{self, BlobStore, FileBlobStore, MemoryBlobStore};
use aptblob::{
    Digests, Distribution, Error, FieldTypes, HashAlgorithm, IndexKind, Paragraph, Repository,
};
use common::{write_deb, write_dsc, FakeSigner};
use flate2::read::GzDecoder;
use std::io::Read;
use tempfile::TempDir;

fn stable() -> Distribution {
    Distribution::new("stable").unwrap()
}

fn template() -> Paragraph {
    Paragraph::new()
        .with("Origin", "Example")
        .with("Suite", "stable")
        .with("Architectures", "amd64 arm64")
        .with("Components", "main")
}

fn release(store: &dyn BlobStore) -> Paragraph {
    let data = store.get("dists/stable/Release").unwrap().into_option().unwrap();
    parse_release(&data).unwrap()
}

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Every Release checksum entry must describe the blob currently stored
fn assert_release_matches_bucket(store: &dyn BlobStore) -> Vec<String> {
    let release = release(store);
    let mut listed = Vec::new();
    for algorithm in HashAlgorithm::ALL {
        let value = release.get(algorithm.release_field()).unwrap();
        let sigs = parse_index_signatures(value, algorithm.output_len()).unwrap();
        for sig in sigs {
            let key = format!("dists/stable/{}", sig.filename);
            let data = store.get(&key).unwrap().into_option().unwrap();
            let digests = Digests::of(&data);
            assert_eq!(sig.size, digests.size, "{} size", key);
            assert_eq!(sig.checksum, digests.get(algorithm), "{} {}", key, algorithm.name());
            if algorithm == HashAlgorithm::Md5 {
                listed.push(sig.filename);
            }
        }
    }
    listed
}

#[test]
fn test_init_and_upload() {
    let temp_dir = TempDir::new().unwrap();
    let packages = [
        write_deb(temp_dir.path(), "hello", "1.0-1", "amd64"),
        write_deb(temp_dir.path(), "hello", "1.0-1", "arm64"),
        write_deb(temp_dir.path(), "hello-doc", "1.0-1", "amd64"),
        write_dsc(temp_dir.path(), "hello", "1.0-1"),
    ];

    let store = MemoryBlobStore::new();
    let repo = Repository::new(&store, stable());
    repo.init_distribution(template()).unwrap();
    let main = repo.dist().component("main").unwrap();
    let summary = repo.upload_packages(&main, &packages).unwrap();

    assert_eq!(summary.binary_packages, 3);
    assert_eq!(summary.source_packages, 1);
    assert_eq!(
        summary.indices,
        [
            "dists/stable/main/binary-amd64/Packages",
            "dists/stable/main/binary-arm64/Packages",
            "dists/stable/main/source/Sources",
        ]
    );

    let release = release(&store);
    assert_eq!(release.fields()[0].name, "Origin");
    assert_eq!(release.get("Suite"), Some("stable"));
    assert_eq!(
        assert_release_matches_bucket(&store),
        [
            "main/binary-amd64/Packages",
            "main/binary-amd64/Packages.gz",
            "main/binary-arm64/Packages",
            "main/binary-arm64/Packages.gz",
            "main/source/Sources",
            "main/source/Sources.gz",
        ]
    );

    let data = store.contents("dists/stable/main/binary-amd64/Packages").unwrap();
    let entries = parse_paragraphs(&data, &FieldTypes::binary_control()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].get("Package"), Some("hello"));
    assert_eq!(entries[0].get("Filename"), Some("pool/hello_1.0-1_amd64.deb"));
    assert_eq!(entries[1].get("Package"), Some("hello-doc"));
    let deb = store.contents("pool/hello_1.0-1_amd64.deb").unwrap();
    let digests = Digests::of(&deb);
    assert_eq!(entries[0].get("Size"), Some(digests.size.to_string().as_str()));
    for algorithm in HashAlgorithm::ALL {
        assert_eq!(
            entries[0].get(algorithm.package_field()),
            Some(digests.hex(algorithm).as_str())
        );
    }

    let gz = store.contents("dists/stable/main/binary-amd64/Packages.gz").unwrap();
    assert_eq!(gunzip(&gz), data);

    let sources = store.contents("dists/stable/main/source/Sources").unwrap();
    let source = parse_single(&sources, &FieldTypes::source_control()).unwrap();
    assert_eq!(source.fields()[0].name, "Package");
    assert_eq!(source.get("Package"), Some("hello"));
    assert_eq!(source.get("Directory"), Some("pool/hello_1.0-1"));
    assert!(store.contents("pool/hello_1.0-1/hello_1.0-1.dsc").is_some());
    assert!(store.contents("pool/hello_1.0-1/hello_1.0-1.tar.xz").is_some());

    // Unsigned: no InRelease or Release.gpg
    assert!(store.contents("dists/stable/InRelease").is_none());
    assert!(store.contents("dists/stable/Release.gpg").is_none());
}

#[test]
fn test_reupload_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let deb = write_deb(temp_dir.path(), "hello", "1.0-1", "amd64");

    let store = MemoryBlobStore::new();
    let repo = Repository::new(&store, stable());
    let main = repo.dist().component("main").unwrap();
    repo.upload_packages(&main, &[&deb]).unwrap();
    let packages = store.contents("dists/stable/main/binary-amd64/Packages").unwrap();
    let first_release = store.contents("dists/stable/Release").unwrap();
    let writes = store.writes().len();

    repo.upload_packages(&main, &[&deb]).unwrap();
    assert_eq!(
        store.contents("dists/stable/main/binary-amd64/Packages").unwrap(),
        packages
    );
    assert_eq!(store.contents("dists/stable/Release").unwrap(), first_release);

    // The pool blob is not rewritten; the two index copies and Release are
    let rewritten = &store.writes()[writes..];
    assert!(!rewritten.iter().any(|key| key.starts_with("pool/")));
    assert_eq!(rewritten.len(), 3);
}

#[test]
fn test_new_version_is_added() {
    let temp_dir = TempDir::new().unwrap();
    let old = write_deb(temp_dir.path(), "hello", "1.0-1", "amd64");
    let new = write_deb(temp_dir.path(), "hello", "1.1-1", "amd64");

    let store = MemoryBlobStore::new();
    let repo = Repository::new(&store, stable());
    let main = repo.dist().component("main").unwrap();
    repo.upload_packages(&main, &[&old]).unwrap();
    repo.upload_packages(&main, &[&new]).unwrap();

    let entries = repo
        .download_index(&main, &IndexKind::binary("amd64"))
        .unwrap();
    let versions: Vec<_> = entries.iter().map(|e| e.get("Version").unwrap()).collect();
    assert_eq!(versions, ["1.0-1", "1.1-1"]);
    assert_release_matches_bucket(&store);
}

#[test]
fn test_unrelated_release_entries_preserved() {
    let store = MemoryBlobStore::new();
    store.insert(
        "dists/stable/Release",
        "Origin: Example\n\
         MD5Sum:\n 0123456789abcdef0123456789abcdef 10 contrib/binary-i386/Packages\n\
         SHA1:\n 0123456789abcdef0123456789abcdef01234567 10 contrib/binary-i386/Packages\n\
         SHA256:\n 0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef 10 contrib/binary-i386/Packages\n",
    );
    let temp_dir = TempDir::new().unwrap();
    let deb = write_deb(temp_dir.path(), "hello", "1.0-1", "amd64");

    let repo = Repository::new(&store, stable());
    let main = repo.dist().component("main").unwrap();
    repo.upload_packages(&main, &[deb]).unwrap();

    let release = release(&store);
    for algorithm in HashAlgorithm::ALL {
        let sigs =
            parse_index_signatures(release.get(algorithm.release_field()).unwrap(), algorithm.output_len())
                .unwrap();
        let names: Vec<_> = sigs.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(
            names,
            [
                "contrib/binary-i386/Packages",
                "main/binary-amd64/Packages",
                "main/binary-amd64/Packages.gz",
            ]
        );
        assert_eq!(sigs[0].size, 10);
    }
}

#[test]
fn test_immutable_mismatch_stops_update() {
    let temp_dir = TempDir::new().unwrap();
    let deb = write_deb(temp_dir.path(), "hello", "1.0-1", "amd64");

    let store = MemoryBlobStore::new();
    store.insert("pool/hello_1.0-1_amd64.deb", "something else");
    let repo = Repository::new(&store, stable());
    let main = repo.dist().component("main").unwrap();

    let err = repo.upload_packages(&main, &[deb]).unwrap_err();
    assert!(matches!(err, Error::ImmutableMismatch { ref key } if key == "pool/hello_1.0-1_amd64.deb"));
    assert!(store.writes().is_empty());
    assert_eq!(
        store.contents("pool/hello_1.0-1_amd64.deb").unwrap(),
        b"something else"
    );
}

#[test]
fn test_signed_release() {
    let temp_dir = TempDir::new().unwrap();
    let deb = write_deb(temp_dir.path(), "hello", "1.0-1", "amd64");

    let store = MemoryBlobStore::new();
    let repo = Repository::new(&store, stable()).with_signer(Some(&FakeSigner));
    let main = repo.dist().component("main").unwrap();
    repo.upload_packages(&main, &[deb]).unwrap();

    let release = store.contents("dists/stable/Release").unwrap();
    let in_release = store.contents("dists/stable/InRelease").unwrap();
    assert!(in_release.starts_with(b"-----BEGIN FAKE SIGNED MESSAGE-----\n"));
    assert!(in_release.ends_with(&release));
    assert_eq!(
        store.contents("dists/stable/Release.gpg").unwrap(),
        format!("-----FAKE SIGNATURE {}-----\n", release.len()).into_bytes()
    );

    let writes = store.writes();
    let tail = &writes[writes.len() - 3..];
    assert_eq!(
        tail,
        ["dists/stable/Release", "dists/stable/InRelease", "dists/stable/Release.gpg"]
    );
}

#[test]
fn test_file_bucket() {
    let bucket = TempDir::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let deb = write_deb(temp_dir.path(), "hello", "1.0-1", "all");

    let store = storage::open(&format!("file://{}", bucket.path().display())).unwrap();
    let repo = Repository::new(store.as_ref(), stable());
    repo.init_distribution(template()).unwrap();
    let main = repo.dist().component("main").unwrap();
    repo.upload_packages(&main, &[deb]).unwrap();

    let root = bucket.path();
    assert!(root.join("pool/hello_1.0-1_all.deb").is_file());
    let packages = std::fs::read(root.join("dists/stable/main/binary-all/Packages")).unwrap();
    let gz = std::fs::read(root.join("dists/stable/main/binary-all/Packages.gz")).unwrap();
    assert_eq!(gunzip(&gz), packages);
    assert_eq!(
        assert_release_matches_bucket(store.as_ref()),
        ["main/binary-all/Packages", "main/binary-all/Packages.gz"]
    );

    // A second handle on the same directory sees the same repository
    let reopened = FileBlobStore::new(root).unwrap();
    assert_eq!(release(&reopened).get("Origin"), Some("Example"));
}
