// src/packages/source.rs

//! Source control files (`.dsc`)
//!
//! Uploaded `.dsc` files are usually clear-signed by the maintainer. The
//! signature is not checked here; only the signed text is indexed.

use crate::control::Paragraph;
use crate::error::{Error, Result};
use openpgp::armor::{Kind, Reader, ReaderMode};
use openpgp::parse::Parse;
use openpgp::{Packet, PacketPile};
use sequoia_openpgp as openpgp;
use std::borrow::Cow;

const BEGIN_SIGNED: &[u8] = b"-----BEGIN PGP SIGNED MESSAGE-----";

/// Plaintext of an OpenPGP clear-signed document.
///
/// Armor headers are dropped and dash-escaping is undone. Input that does
/// not start with a clear-signed armor line is returned unchanged; a
/// malformed clear-signed message is an error.
pub fn strip_clearsign(data: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_clearsigned(data) {
        return Ok(Cow::Borrowed(data));
    }

    let armor = Reader::from_bytes(data, ReaderMode::Tolerant(Some(Kind::Message)));
    let pile = PacketPile::from_reader(armor).map_err(|e| Error::ClearSigned(e.into()))?;
    if !pile.descendants().any(|packet| matches!(packet, Packet::Signature(_))) {
        return Err(Error::ClearSigned("no signature after the signed text".into()));
    }
    let mut text = pile
        .descendants()
        .find_map(|packet| match packet {
            Packet::Literal(literal) => Some(literal.body().to_vec()),
            _ => None,
        })
        .ok_or_else(|| Error::ClearSigned("no signed text".into()))?;

    // The line break before the signature armor is not part of the text
    if !text.ends_with(b"\n") {
        text.push(b'\n');
    }
    Ok(Cow::Owned(text))
}

fn is_clearsigned(data: &[u8]) -> bool {
    data.split(|&b| b == b'\n')
        .map(|line| line.trim_ascii())
        .find(|line| !line.is_empty())
        .is_some_and(|line| line == BEGIN_SIGNED)
}

/// Turn a source control paragraph into a Sources index entry.
///
/// `Source` becomes `Package` and moves to the front, and `Directory`
/// points at the pool directory holding the source files.
pub fn source_index_entry(mut para: Paragraph, dir: &str) -> Paragraph {
    para.rename("Source", "Package");
    para.promote("Package");
    para.set("Directory", dir);
    para
}
