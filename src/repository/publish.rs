// src/repository/publish.rs

//! Package uploads
//!
//! Binary packages go to `pool/<file>.deb`; a source package's `.dsc` and
//! every file it lists go to `pool/<dsc stem>/`. Pool blobs are immutable.
//! Each affected index is then republished and the Release file rewritten
//! once at the end.

use super::{pool_path, upload, Component, IndexKind, Repository};
use crate::control::{self, Paragraph};
use crate::error::{Error, Result, ResultExt};
use crate::hash::{Digests, HashAlgorithm};
use crate::packages::{
    content_type_for, extract_control, source_index_entry, strip_clearsign, PackageKind,
};
use crate::release::parse_index_signatures;
use crate::storage::{validate_key, WriteOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component as PathComponent, Path, PathBuf};
use tracing::{debug, info};

/// What an upload pass published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub binary_packages: usize,
    pub source_packages: usize,
    /// Keys of the plain indices that were republished
    pub indices: Vec<String>,
}

impl Repository<'_> {
    /// Upload a `.deb` to the pool and build its Packages entry.
    ///
    /// Returns the package's architecture along with the entry.
    pub fn upload_binary_package(&self, path: &Path) -> Result<(String, Paragraph)> {
        let name = file_name(path)?;
        let data = fs::read(path).in_file(path.display().to_string())?;
        let control = extract_control(data.as_slice()).in_file(&name)?;
        let mut entry = control::parse_single(&control, &self.fields.binary)
            .in_file(format!("{}: control", name))?;
        entry.promote("Package");
        let arch = entry
            .get("Architecture")
            .filter(|arch| !arch.is_empty())
            .ok_or(Error::MissingField("Architecture"))
            .in_file(&name)?
            .to_string();

        let key = pool_path(&name);
        let options = WriteOptions::new(content_type_for(&name)).immutable();
        let digests = upload(self.store, &key, &data, &options)?;

        entry.set("Filename", key);
        entry.set("Size", digests.size.to_string());
        for algorithm in HashAlgorithm::ALL {
            entry.set(algorithm.package_field(), digests.hex(algorithm));
        }
        debug!("{}: {} for {}", name, entry.get("Package").unwrap_or("?"), arch);
        Ok((arch, entry))
    }

    /// Upload a `.dsc` and the files it lists, and build its Sources entry.
    ///
    /// Every listed file must sit next to the `.dsc` and match the size and
    /// MD5 given in `Files`; nothing is uploaded otherwise.
    pub fn upload_source_package(&self, path: &Path) -> Result<Paragraph> {
        let name = file_name(path)?;
        let stem = name.strip_suffix(".dsc").unwrap_or(&name);
        let dsc = fs::read(path).in_file(path.display().to_string())?;
        let text = strip_clearsign(&dsc).in_file(&name)?;
        let para = control::parse_single(&text, &self.fields.source).in_file(&name)?;

        let dir = pool_path(stem);
        let entry = source_index_entry(para, &dir);
        let files = parse_index_signatures(
            entry.get("Files").unwrap_or(""),
            HashAlgorithm::Md5.output_len(),
        )
        .map_err(|source| Error::Signature {
            field: "Files",
            source,
        })
        .in_file(&name)?;

        let source_dir = path.parent().unwrap_or(Path::new(""));
        let mut contents = Vec::with_capacity(files.len());
        for file in &files {
            if !is_plain_file_name(&file.filename) {
                return Err(Error::InvalidFileName(file.filename.clone())).in_file(&name);
            }
            let file_path: PathBuf = source_dir.join(&file.filename);
            let data = fs::read(&file_path).in_file(file_path.display().to_string())?;
            let digests = Digests::of(&data);
            if digests.size != file.size || digests.md5[..] != file.checksum[..] {
                return Err(Error::ChecksumMismatch {
                    name: file.filename.clone(),
                })
                .in_file(&name);
            }
            contents.push((file.filename.as_str(), data));
        }

        let mut blobs = vec![(format!("{}/{}", dir, name), name.as_str(), dsc.as_slice())];
        blobs.extend(
            contents
                .iter()
                .map(|(filename, data)| (format!("{}/{}", dir, filename), *filename, data.as_slice())),
        );
        for (key, _, _) in &blobs {
            validate_key(key).in_file(&name)?;
        }
        for (key, filename, data) in &blobs {
            let options = WriteOptions::new(content_type_for(filename)).immutable();
            upload(self.store, key, data, &options)?;
        }
        debug!("{}: {} files uploaded to {}", name, files.len() + 1, dir);
        Ok(entry)
    }

    /// Upload packages, republish the affected indices of `component` and
    /// rewrite the Release file.
    ///
    /// `.deb` files are grouped by architecture into `binary-<arch>`
    /// indices and `.dsc` files go into the Sources index. Any other file
    /// is rejected before anything is uploaded. No packages is a no-op.
    pub fn upload_packages<P: AsRef<Path>>(
        &self,
        component: &Component,
        paths: &[P],
    ) -> Result<UploadSummary> {
        if paths.is_empty() {
            info!("No packages given, leaving {} untouched", self.dist);
            return Ok(UploadSummary::default());
        }

        let mut kinds = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let name = file_name(path)?;
            let kind = PackageKind::from_file_name(&name).ok_or(Error::UnsupportedPackage(name))?;
            kinds.push((path, kind));
        }

        let mut summary = UploadSummary::default();
        let mut binaries: BTreeMap<String, Vec<Paragraph>> = BTreeMap::new();
        let mut sources = Vec::new();
        for (path, kind) in kinds {
            info!("Uploading {}", path.display());
            match kind {
                PackageKind::Binary => {
                    let (arch, entry) = self.upload_binary_package(path)?;
                    binaries.entry(arch).or_default().push(entry);
                    summary.binary_packages += 1;
                }
                PackageKind::Source => {
                    sources.push(self.upload_source_package(path)?);
                    summary.source_packages += 1;
                }
            }
        }

        let mut updates: Vec<(IndexKind, Vec<Paragraph>)> = binaries
            .into_iter()
            .map(|(arch, entries)| (IndexKind::binary(arch), entries))
            .collect();
        if !sources.is_empty() {
            updates.push((IndexKind::Source, sources));
        }

        let mut release = self.download_release()?;
        for (kind, entries) in updates {
            release = self.update_index(&release, component, &kind, entries)?;
            summary.indices.push(component.index_key(&kind));
        }
        self.upload_release(&release)?;
        Ok(summary)
    }
}

/// A single path component that stays inside its directory
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(PathComponent::Normal(_)))
        && components.next().is_none()
        && !name.contains(['/', '\\'])
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::UnsupportedPackage(path.display().to_string()))
}
