/*!
Patch application engine driven by structured patch records.

A [`Patch`] record carries the change to one file: status and paths, textual
hunks over a flat line table, or a pair of compressed binary payloads. This
crate locates each hunk at its stated anchor, splices the postimage lines in,
and serializes the result byte for byte; binary patches are inflated, applied
as literals or delta streams, and verified by reverse application. There is
no fuzzy matching and no partial application: a patch either applies exactly
where it says it does, or the file (and any batch it is part of) fails.

Apply a single patch record to in-memory contents:
```rust
use qapply::{apply_patch, Patch, Result};

fn patch_file(source: &[u8], patch: &Patch) -> Result<Vec<u8>> {
    Ok(apply_patch(source, patch)?.contents)
}
```

Apply a whole diff to a repository, as `git apply --index` would:
```rust
use qapply::{apply, ApplyLocation, ApplyOptions, Diff, Repository, Result};

fn apply_everywhere(repo: &Repository, diff: &Diff) -> Result<()> {
    let opts = ApplyOptions {
        location: ApplyLocation::Both,
    };
    apply(repo, diff, &opts)
}
```
*/

#![forbid(unsafe_code)]

mod binary;
mod delta;
mod image;
mod text;

pub mod apply;
pub mod error;
pub mod index;
pub mod patch;
pub mod repo;

pub use apply::{apply, apply_patch, apply_to_tree, Applied, ApplyLocation, ApplyOptions};
pub use error::{Error, Result};
pub use index::{Index, IndexEntry, Tree};
pub use patch::{
    BinaryFile, BinaryKind, BinaryPatch, Delta, Diff, FileInfo, Hunk, HunkLine, LineOrigin, Patch,
    Status, FILEMODE_BLOB, FILEMODE_BLOB_EXECUTABLE,
};
pub use repo::{BlobId, BlobStore, Repository};
