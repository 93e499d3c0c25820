use std::io;

use thiserror::Error;

use crate::repo::BlobId;

/// Errors produced while applying patches.
#[derive(Debug, Error)]
pub enum Error {
    /// A hunk references a line that is not in the patch record.
    #[error("preimage does not contain line {0}")]
    MissingLine(usize),

    /// A hunk's preimage lines do not match the source at the stated anchor.
    #[error("hunk at line {0} did not apply")]
    HunkFailed(u32),

    /// An inflated binary payload disagrees with its declared length.
    #[error("inflated delta does not match expected length")]
    InflatedLengthMismatch,

    /// Reverse-applying the old-file payload did not reconstruct the source.
    #[error("binary patch did not apply cleanly")]
    BinaryVerifyFailed,

    /// The delta is flagged binary but carries no binary payload.
    #[error("patch does not contain binary data")]
    MissingBinaryData,

    /// A deletion patch produced non-empty output.
    #[error("removal patch leaves file contents")]
    RemovalLeavesContents,

    /// The preimage reader has no entry for the path named by the delta.
    #[error("preimage file {0} does not exist")]
    MissingPreimage(String),

    /// The binary delta stream is malformed.
    #[error("corrupt binary delta: {0}")]
    CorruptDelta(&'static str),

    /// The persisted index file is malformed.
    #[error("corrupt index file: {0}")]
    CorruptIndex(&'static str),

    /// An index entry references a blob missing from the object store.
    #[error("object {0} not found")]
    ObjectNotFound(BlobId),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True when the patch was structurally sound but did not match the
    /// preimage it was applied to. These failures abort the current file
    /// and, in a batch, the whole batch; nothing is committed.
    pub fn is_apply_failure(&self) -> bool {
        matches!(
            self,
            Error::MissingLine(_)
                | Error::HunkFailed(_)
                | Error::InflatedLengthMismatch
                | Error::BinaryVerifyFailed
                | Error::MissingBinaryData
                | Error::RemovalLeavesContents
                | Error::MissingPreimage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
