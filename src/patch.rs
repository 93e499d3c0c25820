//! Structured patch records.
//!
//! A [`Patch`] describes the change to one file: a [`Delta`] (status, paths,
//! modes), an ordered list of [`Hunk`]s indexing into a flat line table, and
//! an optional [`BinaryPatch`]. Records are built programmatically; parsing
//! unified diff text into them is a concern of the producer, not of this
//! crate.

/// Mode of an ordinary (non-executable) file entry.
pub const FILEMODE_BLOB: u32 = 0o100644;

/// Mode of an executable file entry.
pub const FILEMODE_BLOB_EXECUTABLE: u32 = 0o100755;

/// What happened to the file described by a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Typechange,
}

/// Path and mode of one side of a delta.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    /// File mode; `0` means "use the default regular file mode".
    pub mode: u32,
}

impl FileInfo {
    pub fn new(path: impl Into<String>, mode: u32) -> Self {
        FileInfo {
            path: path.into(),
            mode,
        }
    }
}

/// Per-file change metadata.
#[derive(Debug, Clone)]
pub struct Delta {
    pub status: Status,
    /// The change content is a binary patch rather than textual hunks.
    pub binary: bool,
    pub old_file: FileInfo,
    pub new_file: FileInfo,
}

/// Where a hunk line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrigin {
    Context,
    Addition,
    Deletion,
}

/// One annotated line of a hunk, owned by the patch record.
///
/// `content` carries the trailing newline when the line has one; a final
/// line without a newline is stored without one, so concatenation is exact.
#[derive(Debug, Clone)]
pub struct HunkLine {
    pub origin: LineOrigin,
    pub content: Vec<u8>,
}

impl HunkLine {
    pub fn context(content: impl Into<Vec<u8>>) -> Self {
        HunkLine {
            origin: LineOrigin::Context,
            content: content.into(),
        }
    }

    pub fn addition(content: impl Into<Vec<u8>>) -> Self {
        HunkLine {
            origin: LineOrigin::Addition,
            content: content.into(),
        }
    }

    pub fn deletion(content: impl Into<Vec<u8>>) -> Self {
        HunkLine {
            origin: LineOrigin::Deletion,
            content: content.into(),
        }
    }
}

/// One contiguous change region of a textual patch.
///
/// The annotated lines live in the patch's flat line table;
/// `line_start..line_start + line_count` is this hunk's slice of it.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// 1-based line number in the postimage where the first postimage line
    /// of this hunk belongs; `0` anchors at the top of the file.
    pub new_start: u32,
    pub line_start: usize,
    pub line_count: usize,
}

/// How a binary payload transforms its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// The inflated payload is the whole result.
    Literal,
    /// The inflated payload is a delta stream against the source.
    Delta,
}

/// One side of a binary patch: a compressed payload and its declared
/// inflated length. Empty `data` means the side is identical to its source.
#[derive(Debug, Clone)]
pub struct BinaryFile {
    pub kind: BinaryKind,
    /// zlib-compressed payload.
    pub data: Vec<u8>,
    /// Authoritative size of the payload after inflation.
    pub inflated_len: usize,
}

impl BinaryFile {
    pub fn new(kind: BinaryKind, data: Vec<u8>, inflated_len: usize) -> Self {
        BinaryFile {
            kind,
            data,
            inflated_len,
        }
    }
}

/// Binary change content: the forward payload and the reverse payload used
/// to verify the application.
#[derive(Debug, Clone)]
pub struct BinaryPatch {
    /// Transforms source into target.
    pub new_file: BinaryFile,
    /// Transforms target back into source.
    pub old_file: BinaryFile,
}

/// The full change record for one file.
#[derive(Debug, Clone)]
pub struct Patch {
    pub delta: Delta,
    /// Flat table of annotated lines shared by all hunks.
    pub lines: Vec<HunkLine>,
    pub hunks: Vec<Hunk>,
    pub binary: Option<BinaryPatch>,
}

impl Patch {
    /// A patch with no change content yet.
    pub fn new(delta: Delta) -> Self {
        Patch {
            delta,
            lines: Vec::new(),
            hunks: Vec::new(),
            binary: None,
        }
    }

    /// Append a hunk, moving its lines into the flat table.
    pub fn push_hunk(&mut self, new_start: u32, lines: impl IntoIterator<Item = HunkLine>) {
        let line_start = self.lines.len();
        self.lines.extend(lines);
        self.hunks.push(Hunk {
            new_start,
            line_start,
            line_count: self.lines.len() - line_start,
        });
    }

    /// Attach binary change content and flag the delta binary.
    pub fn set_binary(&mut self, binary: BinaryPatch) {
        self.delta.binary = true;
        self.binary = Some(binary);
    }
}

/// An ordered set of per-file patches, applied as one batch.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    patches: Vec<Patch>,
}

impl Diff {
    pub fn new() -> Self {
        Diff::default()
    }

    pub fn push(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    /// Number of deltas in the batch.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn delta(&self, index: usize) -> Option<&Delta> {
        self.patches.get(index).map(|p| &p.delta)
    }

    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter()
    }

    pub fn deltas(&self) -> impl Iterator<Item = &Delta> {
        self.patches.iter().map(|p| &p.delta)
    }
}

impl From<Vec<Patch>> for Diff {
    fn from(patches: Vec<Patch>) -> Self {
        Diff { patches }
    }
}
