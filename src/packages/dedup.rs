// src/packages/dedup.rs

//! Package deduplication for Packages and Sources indices

use crate::control::Paragraph;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Keep one paragraph per (`Package`, `Version`) pair.
///
/// Each identity stays at the position of its first occurrence and carries
/// the content of its last. Fails without partial output if any paragraph
/// lacks either field.
pub fn dedupe_packages(packages: Vec<Paragraph>) -> Result<Vec<Paragraph>> {
    let mut slots: HashMap<(String, String), usize> = HashMap::with_capacity(packages.len());
    let mut deduped: Vec<Paragraph> = Vec::with_capacity(packages.len());

    for (i, para) in packages.into_iter().enumerate() {
        let identity = identity(&para).ok_or_else(|| Error::MissingIdentity {
            index: i + 1,
            field: if non_empty(&para, "Package").is_none() {
                "Package"
            } else {
                "Version"
            },
        })?;
        match slots.get(&identity) {
            Some(&slot) => deduped[slot] = para,
            None => {
                slots.insert(identity, deduped.len());
                deduped.push(para);
            }
        }
    }
    Ok(deduped)
}

fn identity(para: &Paragraph) -> Option<(String, String)> {
    let package = non_empty(para, "Package")?;
    let version = non_empty(para, "Version")?;
    Some((package.to_string(), version.to_string()))
}

fn non_empty<'a>(para: &'a Paragraph, name: &str) -> Option<&'a str> {
    para.get(name).filter(|v| !v.is_empty())
}
