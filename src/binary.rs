//! Binary patch application.

use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;

use crate::delta;
use crate::error::{Error, Result};
use crate::patch::{BinaryFile, BinaryKind, Patch};

/// Inflate a zlib-compressed payload held in memory.
fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(Cursor::new(data)).read_to_end(&mut inflated)?;
    Ok(inflated)
}

/// Apply one side of a binary patch to `source`.
fn apply_binary_file(source: &[u8], file: &BinaryFile) -> Result<Vec<u8>> {
    // No payload means identical contents.
    if file.data.is_empty() {
        return Ok(source.to_vec());
    }

    let inflated = inflate(&file.data)?;
    if inflated.len() != file.inflated_len {
        return Err(Error::InflatedLengthMismatch);
    }

    match file.kind {
        BinaryKind::Literal => Ok(inflated),
        BinaryKind::Delta => delta::apply(source, &inflated),
    }
}

/// Apply the forward payload, then reverse-apply the old-file payload and
/// require that it reconstructs `source` byte for byte. Binary application
/// without this round trip is not offered.
pub(crate) fn apply_binary(source: &[u8], patch: &Patch) -> Result<Vec<u8>> {
    let binary = patch.binary.as_ref().ok_or(Error::MissingBinaryData)?;

    if binary.old_file.data.is_empty() && binary.new_file.data.is_empty() {
        return Ok(Vec::new());
    }

    let forward = apply_binary_file(source, &binary.new_file)?;
    let reverse = apply_binary_file(&forward, &binary.old_file)?;

    if reverse != source {
        return Err(Error::BinaryVerifyFailed);
    }

    Ok(forward)
}
