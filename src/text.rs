//! Textual hunk application.

use crate::error::{Error, Result};
use crate::image::LineImage;
use crate::patch::{Hunk, LineOrigin, Patch};

/// Apply every hunk of `patch` to `source` in declared order and serialize
/// the result.
pub(crate) fn apply_hunks<'a>(source: &'a [u8], patch: &'a Patch) -> Result<Vec<u8>> {
    let mut image = LineImage::from_bytes(source);

    for hunk in &patch.hunks {
        apply_hunk(&mut image, patch, hunk)?;
    }

    Ok(image.to_bytes())
}

/// Locate one hunk in the image and splice its postimage lines in.
///
/// Each hunk's `new_start` is interpreted against the current, partially
/// updated image: anchors are monotonically ordered within a patch, so
/// earlier hunks only ever edit strictly before a later hunk's anchor.
fn apply_hunk<'a>(image: &mut LineImage<'a>, patch: &'a Patch, hunk: &Hunk) -> Result<()> {
    let mut preimage: Vec<&[u8]> = Vec::new();
    let mut postimage: Vec<&[u8]> = Vec::new();

    for linenum in hunk.line_start..hunk.line_start + hunk.line_count {
        let line = patch.lines.get(linenum).ok_or(Error::MissingLine(linenum))?;

        if matches!(line.origin, LineOrigin::Context | LineOrigin::Deletion) {
            preimage.push(&line.content);
        }
        if matches!(line.origin, LineOrigin::Context | LineOrigin::Addition) {
            postimage.push(&line.content);
        }
    }

    // new_start is 1-based; 0 anchors at the top. Clamp to the image so a
    // pure-addition hunk can anchor just past the last line.
    let anchor = match hunk.new_start {
        0 => 0,
        n => n as usize - 1,
    };
    let anchor = anchor.min(image.len());

    if !image.matches_at(&preimage, anchor) {
        return Err(Error::HunkFailed(hunk.new_start));
    }

    image.splice(anchor, preimage.len(), &postimage);

    Ok(())
}
