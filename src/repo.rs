//! Repository plumbing: the object store, preimage readers, and the
//! workdir checkout primitives used when committing a batch.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::index::{Index, IndexEntry, Tree};
#[cfg(unix)]
use crate::patch::FILEMODE_BLOB_EXECUTABLE;

const STATE_DIR: &str = ".qapply";
const OBJECTS_DIR: &str = "objects";
const INDEX_FILE: &str = "index";
const INDEX_LOCK: &str = "index.lock";

/// Content address of a blob: the SHA-256 of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId([u8; 32]);

impl BlobId {
    /// Address of the given contents.
    pub fn hash(data: &[u8]) -> Self {
        BlobId(Sha256::digest(data).into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        BlobId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Content-addressed store of blob files under `objects/`.
#[derive(Debug)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    fn open(root: PathBuf) -> Self {
        BlobStore { root }
    }

    fn blob_path(&self, id: &BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Store `data`, returning its address. Writing the same contents
    /// twice is a no-op.
    pub fn write(&self, data: &[u8]) -> Result<BlobId> {
        let id = BlobId::hash(data);
        let path = self.blob_path(&id);
        if !path.exists() {
            fs::write(path, data)?;
        }
        Ok(id)
    }

    /// Fetch the contents stored at `id`.
    pub fn read(&self, id: &BlobId) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(id)) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::ObjectNotFound(*id)),
            Err(err) => Err(err.into()),
        }
    }
}

/// A working directory plus the state kept beside it (object store and
/// persisted index) under `.qapply/`.
#[derive(Debug)]
pub struct Repository {
    workdir: PathBuf,
    state: PathBuf,
    blobs: BlobStore,
}

impl Repository {
    /// Create the state directory layout under `workdir` and open it.
    pub fn init(workdir: impl Into<PathBuf>) -> Result<Self> {
        let workdir = workdir.into();
        let state = workdir.join(STATE_DIR);
        fs::create_dir_all(state.join(OBJECTS_DIR))?;
        Ok(Repository {
            blobs: BlobStore::open(state.join(OBJECTS_DIR)),
            workdir,
            state,
        })
    }

    /// Open an existing repository rooted at `workdir`.
    pub fn open(workdir: impl Into<PathBuf>) -> Result<Self> {
        let workdir = workdir.into();
        let state = workdir.join(STATE_DIR);
        if !state.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a qapply repository", workdir.display()),
            )));
        }
        Ok(Repository {
            blobs: BlobStore::open(state.join(OBJECTS_DIR)),
            workdir,
            state,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Load the persisted index; a repository that has never written one
    /// has an empty index.
    pub fn index(&self) -> Result<Index> {
        match fs::File::open(self.state.join(INDEX_FILE)) {
            Ok(file) => Index::read_from(io::BufReader::new(file)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Index::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist `index`, writing through a sibling lock file renamed into
    /// place so a failed write never truncates the previous index.
    pub fn write_index(&self, index: &Index) -> Result<()> {
        let lock = self.state.join(INDEX_LOCK);
        let mut file = io::BufWriter::new(fs::File::create(&lock)?);
        index.write_to(&mut file)?;
        io::Write::flush(&mut file)?;
        drop(file);
        fs::rename(lock, self.state.join(INDEX_FILE))?;
        Ok(())
    }
}

/// Reads preimage contents by path from a working tree, an index snapshot,
/// or a tree snapshot.
pub(crate) trait ContentReader {
    /// `Ok(None)` when the path has no entry.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

pub(crate) struct WorkdirReader<'r> {
    repo: &'r Repository,
}

impl<'r> WorkdirReader<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        WorkdirReader { repo }
    }
}

impl ContentReader for WorkdirReader<'_> {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.repo.workdir().join(path)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) struct IndexReader<'r> {
    repo: &'r Repository,
    index: Index,
}

impl<'r> IndexReader<'r> {
    /// Snapshot the repository index at construction time.
    pub fn new(repo: &'r Repository) -> Result<Self> {
        Ok(IndexReader {
            index: repo.index()?,
            repo,
        })
    }
}

impl ContentReader for IndexReader<'_> {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.index.get(path) {
            Some(entry) => self.repo.blobs().read(&entry.id).map(Some),
            None => Ok(None),
        }
    }
}

pub(crate) struct TreeReader<'r> {
    repo: &'r Repository,
    tree: &'r Tree,
}

impl<'r> TreeReader<'r> {
    pub fn new(repo: &'r Repository, tree: &'r Tree) -> Self {
        TreeReader { repo, tree }
    }
}

impl ContentReader for TreeReader<'_> {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.tree.get(path) {
            Some(entry) => self.repo.blobs().read(&entry.id).map(Some),
            None => Ok(None),
        }
    }
}

/// Write one staged entry into the working directory, creating parent
/// directories and applying the executable bit where the platform has one.
pub(crate) fn checkout_entry(repo: &Repository, entry: &IndexEntry) -> Result<()> {
    let path = repo.workdir().join(&entry.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = repo.blobs().read(&entry.id)?;
    tracing::trace!("checking out {} ({} bytes)", entry.path, contents.len());
    fs::write(&path, contents)?;

    #[cfg(unix)]
    if entry.mode == FILEMODE_BLOB_EXECUTABLE {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Remove a working-directory file that the postimage no longer contains.
/// A path that is already gone is fine.
pub(crate) fn remove_workdir_file(repo: &Repository, path: &str) -> Result<()> {
    tracing::trace!("removing {path}");
    match fs::remove_file(repo.workdir().join(path)) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::Repository;
    use crate::error::Error;
    use crate::index::IndexEntry;
    use crate::patch::FILEMODE_BLOB;

    #[test]
    fn blob_writes_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let first = repo.blobs().write(b"contents").unwrap();
        let second = repo.blobs().write(b"contents").unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.blobs().read(&first).unwrap(), b"contents");
    }

    #[test]
    fn missing_blob_is_reported_by_id() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let id = super::BlobId::hash(b"never stored");
        assert!(matches!(
            repo.blobs().read(&id),
            Err(Error::ObjectNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn index_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert!(repo.index().unwrap().is_empty());

        let id = repo.blobs().write(b"contents").unwrap();
        let mut index = repo.index().unwrap();
        index.add(IndexEntry {
            path: "a.txt".into(),
            mode: FILEMODE_BLOB,
            id,
        });
        repo.write_index(&index).unwrap();

        let reopened = Repository::open(dir.path()).unwrap();
        let loaded = reopened.index().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("a.txt").unwrap().id, id);
    }
}
