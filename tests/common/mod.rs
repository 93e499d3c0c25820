#![allow(unused)]

use std::fs;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use qapply::{
    BinaryFile, BinaryKind, Delta, FileInfo, Index, IndexEntry, Patch, Repository, Status,
    FILEMODE_BLOB,
};
use tempfile::TempDir;

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A literal payload that inflates to `data`.
pub fn literal(data: &[u8]) -> BinaryFile {
    BinaryFile::new(BinaryKind::Literal, deflate(data), data.len())
}

/// A literal payload whose declared inflated length is a lie.
pub fn literal_declaring(data: &[u8], inflated_len: usize) -> BinaryFile {
    BinaryFile::new(BinaryKind::Literal, deflate(data), inflated_len)
}

/// A delta payload carrying the raw instruction stream `stream`.
pub fn delta_payload(stream: &[u8]) -> BinaryFile {
    BinaryFile::new(BinaryKind::Delta, deflate(stream), stream.len())
}

/// A payload with no data at all: "identical to source".
pub fn no_payload() -> BinaryFile {
    BinaryFile::new(BinaryKind::Literal, Vec::new(), 0)
}

pub fn varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out
}

/// A delta stream turning `base` into `base` + `tail`: one whole-base copy
/// followed by literal inserts.
pub fn delta_append(base: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut stream = varint(base.len() as u64);
    stream.extend(varint((base.len() + tail.len()) as u64));
    if !base.is_empty() {
        // copy at offset zero with three explicit size bytes
        stream.push(0x80 | 0x10 | 0x20 | 0x40);
        stream.extend_from_slice(&(base.len() as u32).to_le_bytes()[..3]);
    }
    for chunk in tail.chunks(127) {
        stream.push(chunk.len() as u8);
        stream.extend_from_slice(chunk);
    }
    stream
}

pub fn modified(path: &str) -> Delta {
    Delta {
        status: Status::Modified,
        binary: false,
        old_file: FileInfo::new(path, 0),
        new_file: FileInfo::new(path, 0),
    }
}

pub fn added(path: &str) -> Delta {
    Delta {
        status: Status::Added,
        binary: false,
        old_file: FileInfo::new(path, 0),
        new_file: FileInfo::new(path, 0),
    }
}

pub fn deleted(path: &str) -> Delta {
    Delta {
        status: Status::Deleted,
        binary: false,
        old_file: FileInfo::new(path, 0),
        new_file: FileInfo::new(path, 0),
    }
}

pub fn renamed(old: &str, new: &str) -> Delta {
    Delta {
        status: Status::Renamed,
        binary: false,
        old_file: FileInfo::new(old, 0),
        new_file: FileInfo::new(new, 0),
    }
}

pub fn temp_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    (dir, repo)
}

/// Put `contents` at `path` in the workdir, the object store, and the
/// persisted index, so every preimage reader can see it.
pub fn seed_file(repo: &Repository, path: &str, contents: &[u8]) {
    let file = repo.workdir().join(path);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(file, contents).unwrap();

    let id = repo.blobs().write(contents).unwrap();
    let mut index = repo.index().unwrap();
    index.add(IndexEntry {
        path: path.into(),
        mode: FILEMODE_BLOB,
        id,
    });
    repo.write_index(&index).unwrap();
}

pub fn workdir_contents(repo: &Repository, path: &str) -> Option<Vec<u8>> {
    fs::read(repo.workdir().join(path)).ok()
}

pub fn index_contents(repo: &Repository, path: &str) -> Option<Vec<u8>> {
    let index = repo.index().unwrap();
    let entry = index.get(path)?;
    Some(repo.blobs().read(&entry.id).unwrap())
}
