//! Per-file and batch patch application.

use std::collections::BTreeSet;

use crate::binary;
use crate::error::{Error, Result};
use crate::index::{Index, IndexEntry, Tree};
use crate::patch::{Diff, Patch, Status, FILEMODE_BLOB};
use crate::repo::{
    checkout_entry, remove_workdir_file, ContentReader, IndexReader, Repository, TreeReader,
    WorkdirReader,
};
use crate::text;

/// Where a batch application lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyLocation {
    /// Apply to the working directory only; the index is not touched.
    #[default]
    Workdir,
    /// Apply to the index only; the working directory is not touched.
    Index,
    /// Apply to both the index and the working directory.
    Both,
}

/// Options for [`apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub location: ApplyLocation,
}

/// Outcome of applying one patch to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub contents: Vec<u8>,
    /// Path of the postimage; `None` for a deletion patch.
    pub path: Option<String>,
    /// Mode of the postimage; `0` for a deletion patch.
    pub mode: u32,
}

/// Apply one patch record to the preimage bytes of one file.
///
/// Dispatches on the change content: binary patches round-trip through the
/// binary applier, patches with hunks go through line splicing, and a patch
/// with neither (pure rename, mode change, empty add) passes the source
/// through verbatim.
pub fn apply_patch(source: &[u8], patch: &Patch) -> Result<Applied> {
    let delta = &patch.delta;

    let (path, mode) = if delta.status == Status::Deleted {
        (None, 0)
    } else {
        let mode = match delta.new_file.mode {
            0 => FILEMODE_BLOB,
            mode => mode,
        };
        (Some(delta.new_file.path.clone()), mode)
    };

    let contents = if delta.binary {
        binary::apply_binary(source, patch)?
    } else if !patch.hunks.is_empty() {
        text::apply_hunks(source, patch)?
    } else {
        source.to_vec()
    };

    if delta.status == Status::Deleted && !contents.is_empty() {
        return Err(Error::RemovalLeavesContents);
    }

    Ok(Applied { contents, path, mode })
}

/// Apply a whole diff against a tree snapshot, without touching the
/// working directory or the repository index.
///
/// The returned index is the postimage: the input tree's entries with every
/// delta of `diff` applied on top.
pub fn apply_to_tree(repo: &Repository, preimage: &Tree, diff: &Diff) -> Result<Index> {
    let reader = TreeReader::new(repo, preimage);

    let mut postimage = Index::new();
    postimage.read_tree(preimage);

    apply_deltas(repo, &reader, &mut postimage, diff)?;

    Ok(postimage)
}

/// Apply a whole diff to the repository, committing the result to the
/// location selected in `opts`.
///
/// Nothing is committed unless every delta applies; a failure part way
/// through leaves the index and working directory untouched (blobs already
/// written stay in the object store).
pub fn apply(repo: &Repository, diff: &Diff, opts: &ApplyOptions) -> Result<()> {
    tracing::debug!("applying {} deltas to {:?}", diff.len(), opts.location);

    let mut postimage = Index::new();

    match opts.location {
        ApplyLocation::Workdir => {
            let reader = WorkdirReader::new(repo);
            apply_deltas(repo, &reader, &mut postimage, diff)?;
        }
        ApplyLocation::Index | ApplyLocation::Both => {
            let reader = IndexReader::new(repo)?;
            apply_deltas(repo, &reader, &mut postimage, diff)?;
        }
    }

    match opts.location {
        ApplyLocation::Index => commit_to_index(repo, diff, &postimage),
        location => commit_to_workdir(repo, diff, &postimage, location),
    }
}

/// Run every delta of `diff` against `postimage` in declared order.
fn apply_deltas(
    repo: &Repository,
    reader: &dyn ContentReader,
    postimage: &mut Index,
    diff: &Diff,
) -> Result<()> {
    // Drop every old path before staging anything, so a rename's target
    // can land on a path another delta vacates.
    for delta in diff.deltas() {
        postimage.remove(&delta.old_file.path);
    }

    for patch in diff.patches() {
        apply_one(repo, reader, postimage, patch)?;
    }

    Ok(())
}

/// Apply one delta: read its preimage, patch it, and stage the result.
fn apply_one(
    repo: &Repository,
    reader: &dyn ContentReader,
    postimage: &mut Index,
    patch: &Patch,
) -> Result<()> {
    let delta = &patch.delta;
    tracing::debug!("applying {:?} delta for {}", delta.status, delta.old_file.path);

    // The pre-pass already unstaged the old path.
    if delta.status == Status::Deleted {
        return Ok(());
    }

    let pre_contents = if delta.status == Status::Added {
        Vec::new()
    } else {
        reader
            .read(&delta.old_file.path)?
            .ok_or_else(|| Error::MissingPreimage(delta.old_file.path.clone()))?
    };

    let applied = apply_patch(&pre_contents, patch)?;
    let Some(path) = applied.path else {
        return Ok(());
    };

    let id = repo.blobs().write(&applied.contents)?;
    postimage.add(IndexEntry {
        path,
        mode: applied.mode,
        id,
    });

    Ok(())
}

/// Affected paths of a diff: every old path (except a copy's origin, which
/// must survive) plus every differing new path.
fn affected_paths(diff: &Diff) -> BTreeSet<&str> {
    let mut paths = BTreeSet::new();
    for delta in diff.deltas() {
        if delta.status != Status::Copied {
            paths.insert(delta.old_file.path.as_str());
        }
        if delta.new_file.path != delta.old_file.path {
            paths.insert(delta.new_file.path.as_str());
        }
    }
    paths
}

/// Merge the postimage into the repository index and persist it.
fn commit_to_index(repo: &Repository, diff: &Diff, postimage: &Index) -> Result<()> {
    let mut index = repo.index()?;

    for delta in diff.deltas() {
        if matches!(delta.status, Status::Deleted | Status::Renamed) {
            index.remove(&delta.old_file.path);
        }
    }

    for entry in postimage.entries() {
        index.add(entry.clone());
    }

    repo.write_index(&index)
}

/// Check out the postimage restricted to the paths the diff touches, so
/// unrelated working-directory changes stay put. With
/// [`ApplyLocation::Both`], every write and removal is mirrored into the
/// repository index.
fn commit_to_workdir(
    repo: &Repository,
    diff: &Diff,
    postimage: &Index,
    location: ApplyLocation,
) -> Result<()> {
    let mut index = match location {
        ApplyLocation::Both => Some(repo.index()?),
        _ => None,
    };

    for path in affected_paths(diff) {
        match postimage.get(path) {
            Some(entry) => {
                checkout_entry(repo, entry)?;
                if let Some(index) = index.as_mut() {
                    index.add(entry.clone());
                }
            }
            None => {
                remove_workdir_file(repo, path)?;
                if let Some(index) = index.as_mut() {
                    index.remove(path);
                }
            }
        }
    }

    if let Some(index) = index {
        repo.write_index(&index)?;
    }

    Ok(())
}
