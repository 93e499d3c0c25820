//! Pack-style binary delta streams.
//!
//! A delta stream starts with two varint sizes (expected base length,
//! declared result length) followed by instructions: a copy opcode with the
//! high bit set selects a bounds-checked range of the base, any other
//! non-zero opcode inserts that many literal bytes from the stream itself.

use crate::error::{Error, Result};

/// Largest range a single copy instruction can cover; a copy with no size
/// bytes encodes exactly this length.
const COPY_MAX: usize = 0x10000;

/// Apply a delta stream to `base`, producing the result buffer.
pub(crate) fn apply(base: &[u8], delta: &[u8]) -> Result<Vec<u8>> {
    let mut delta = delta;

    let base_len = read_varint(&mut delta)?;
    if base_len != base.len() as u64 {
        return Err(Error::CorruptDelta("base length does not match delta header"));
    }

    let result_len = read_varint(&mut delta)?;
    let mut out = Vec::with_capacity(result_len as usize);

    while let Some((&op, rest)) = delta.split_first() {
        delta = rest;

        if op & 0x80 != 0 {
            let (offset, size) = read_copy(op, &mut delta)?;
            let end = offset
                .checked_add(size)
                .filter(|&end| end <= base.len())
                .ok_or(Error::CorruptDelta("copy range exceeds base"))?;
            out.extend_from_slice(&base[offset..end]);
        } else if op != 0 {
            let count = op as usize;
            if delta.len() < count {
                return Err(Error::CorruptDelta("truncated insert instruction"));
            }
            let (data, rest) = delta.split_at(count);
            out.extend_from_slice(data);
            delta = rest;
        } else {
            // Opcode 0 is reserved.
            return Err(Error::CorruptDelta("unsupported instruction"));
        }
    }

    if out.len() as u64 != result_len {
        return Err(Error::CorruptDelta("result length does not match delta header"));
    }

    Ok(out)
}

/// Read a little-endian base-128 varint with continuation bits.
fn read_varint(delta: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0;

    loop {
        let (&byte, rest) = delta
            .split_first()
            .ok_or(Error::CorruptDelta("truncated size header"))?;
        *delta = rest;

        if shift >= 64 {
            return Err(Error::CorruptDelta("size header overflows"));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Decode the offset and size of a copy instruction. The low bits of the
/// opcode select which of the packed little-endian bytes are present.
fn read_copy(op: u8, delta: &mut &[u8]) -> Result<(usize, usize)> {
    let mut take = |bit: u8| -> Result<usize> {
        if op & bit == 0 {
            return Ok(0);
        }
        let (&byte, rest) = delta
            .split_first()
            .ok_or(Error::CorruptDelta("truncated copy instruction"))?;
        *delta = rest;
        Ok(byte as usize)
    };

    let offset = take(0x01)? | take(0x02)? << 8 | take(0x04)? << 16 | take(0x08)? << 24;
    let mut size = take(0x10)? | take(0x20)? << 8 | take(0x40)? << 16;
    if size == 0 {
        size = COPY_MAX;
    }

    Ok((offset, size))
}
