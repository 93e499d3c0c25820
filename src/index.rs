//! In-memory index of path/mode/blob entries, with a persisted form.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::repo::BlobId;

const INDEX_MAGIC: &[u8; 4] = b"QIDX";
const INDEX_VERSION: u32 = 1;

/// One staged file: where it lives, its mode, and the blob holding its
/// contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: String,
    pub mode: u32,
    pub id: BlobId,
}

/// Ordered mapping from path to [`IndexEntry`].
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    /// Insert an entry, replacing any existing entry at its path.
    pub fn add(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    /// Remove the entry at `path`, reporting whether one existed. Removing
    /// an absent path is not an error: the batch pre-pass removes every
    /// delta's old path whether or not it was ever staged.
    pub fn remove(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Seed this index from a tree snapshot, replacing entries at
    /// colliding paths.
    pub fn read_tree(&mut self, tree: &Tree) {
        for entry in tree.entries() {
            self.add(entry.clone());
        }
    }

    /// Decode an index from its persisted form.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != INDEX_MAGIC {
            return Err(Error::CorruptIndex("bad magic"));
        }
        if reader.read_u32::<BigEndian>()? != INDEX_VERSION {
            return Err(Error::CorruptIndex("unsupported version"));
        }

        let count = reader.read_u32::<BigEndian>()?;
        let mut index = Index::new();
        for _ in 0..count {
            let mode = reader.read_u32::<BigEndian>()?;

            let mut id = [0u8; 32];
            reader.read_exact(&mut id)?;

            let path_len = reader.read_u32::<BigEndian>()? as usize;
            let mut path = vec![0u8; path_len];
            reader.read_exact(&mut path)?;
            let path = String::from_utf8(path)
                .map_err(|_| Error::CorruptIndex("path is not valid UTF-8"))?;

            index.add(IndexEntry {
                path,
                mode,
                id: BlobId::from_bytes(id),
            });
        }

        Ok(index)
    }

    /// Encode the index into its persisted form.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(INDEX_MAGIC)?;
        writer.write_u32::<BigEndian>(INDEX_VERSION)?;
        writer.write_u32::<BigEndian>(self.entries.len() as u32)?;

        for entry in self.entries.values() {
            writer.write_u32::<BigEndian>(entry.mode)?;
            writer.write_all(entry.id.as_bytes())?;
            writer.write_u32::<BigEndian>(entry.path.len() as u32)?;
            writer.write_all(entry.path.as_bytes())?;
        }

        Ok(())
    }
}

/// A read-only snapshot of path/mode/blob entries, the preimage side of
/// tree-to-tree application.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    entries: BTreeMap<String, IndexEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn insert(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}

impl From<&Index> for Tree {
    fn from(index: &Index) -> Self {
        Tree {
            entries: index.entries.clone(),
        }
    }
}
