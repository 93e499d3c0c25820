//! Line-oriented view of a byte buffer, mutable by splicing.

/// An ordered sequence of lines borrowed from a source buffer and from the
/// patch record being applied. Concatenating every line in order reproduces
/// the buffer the image currently represents, byte for byte.
pub(crate) struct LineImage<'a> {
    lines: Vec<&'a [u8]>,
}

impl<'a> LineImage<'a> {
    /// Split `buf` at every `\n`, keeping the terminator with its line.
    ///
    /// A buffer that does not end in `\n` yields a final line without one;
    /// an empty buffer yields an empty image.
    pub fn from_bytes(buf: &'a [u8]) -> Self {
        let mut lines = Vec::new();
        let mut rest = buf;
        while !rest.is_empty() {
            let end = match rest.iter().position(|&b| b == b'\n') {
                Some(at) => at + 1,
                None => rest.len(),
            };
            let (line, tail) = rest.split_at(end);
            lines.push(line);
            rest = tail;
        }
        LineImage { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Random access. Indexing out of range is a programmer error.
    pub fn line(&self, at: usize) -> &'a [u8] {
        self.lines[at]
    }

    /// True iff every line of `preimage` occurs at `at`, byte for byte.
    ///
    /// A sequence extending past the end of the image never matches; the
    /// empty sequence matches at any in-bounds position.
    pub fn matches_at(&self, preimage: &[&[u8]], at: usize) -> bool {
        if at + preimage.len() > self.lines.len() {
            return false;
        }
        preimage
            .iter()
            .enumerate()
            .all(|(i, expected)| *expected == self.line(at + i))
    }

    /// Remove `remove` lines at `at` and insert `insert` in their place.
    pub fn splice(&mut self, at: usize, remove: usize, insert: &[&'a [u8]]) {
        self.lines.splice(at..at + remove, insert.iter().copied());
    }

    /// Concatenate every line in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.lines.iter().map(|l| l.len()).sum();
        let mut out = Vec::with_capacity(size);
        for line in &self.lines {
            out.extend_from_slice(line);
        }
        out
    }
}
