//! Rewrite expectations in place
//!
//! A [`Region::Range`] is replaced without touching the rest of the file: bytes after the
//! region are shifted by the change in length, one chunk at a time, so memory use stays
//! bounded by the chunk size.
//!
//! There is no atomicity: a failure part-way through leaves the file partially modified,
//! reported by [`BlessError::is_partial`].

use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::content::Region;

/// Bytes moved per read/write when resizing a region
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Failure to update an expectation
#[derive(Debug)]
pub struct BlessError {
    path: PathBuf,
    source: std::io::Error,
    partial: bool,
}

impl BlessError {
    fn new(path: &Path, source: std::io::Error, partial: bool) -> Self {
        Self {
            path: path.to_owned(),
            source,
            partial,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file may have been left half-written
    pub fn is_partial(&self) -> bool {
        self.partial
    }
}

impl std::fmt::Display for BlessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to update {}: {}", self.path.display(), self.source)?;
        if self.partial {
            write!(f, " (file may be partially modified)")?;
        }
        Ok(())
    }
}

impl std::error::Error for BlessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Replace `region` of the file at `path` with `content`
pub fn bless(
    path: impl AsRef<Path>,
    region: &Region,
    content: impl Read + Seek,
) -> Result<(), BlessError> {
    Blesser::new().bless(path, region, content)
}

#[derive(Copy, Clone, Debug)]
pub struct Blesser {
    chunk_size: usize,
}

impl Blesser {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Bytes moved per step when the region changes length; at least 1
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn bless(
        &self,
        path: impl AsRef<Path>,
        region: &Region,
        mut content: impl Read + Seek,
    ) -> Result<(), BlessError> {
        let path = path.as_ref();
        let new_len = content
            .seek(SeekFrom::End(0))
            .and_then(|len| content.rewind().map(|()| len))
            .map_err(|e| BlessError::new(path, e, false))?;
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| BlessError::new(path, e, false))?;
        let file_len = file
            .metadata()
            .map_err(|e| BlessError::new(path, e, false))?
            .len();
        if let Region::Range(range) = region {
            if range.end < range.start || file_len < range.end {
                let err = std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "region {}..{} is outside of the file ({file_len} bytes)",
                        range.start, range.end
                    ),
                );
                return Err(BlessError::new(path, err, false));
            }
        }

        goldbox_macros::debug!(
            "blessing {} {:?} with {} bytes",
            path.display(),
            region,
            new_len
        );
        self.rewrite(&mut file, file_len, region, &mut content, new_len)
            .map_err(|e| BlessError::new(path, e, true))
    }

    fn rewrite(
        &self,
        file: &mut std::fs::File,
        file_len: u64,
        region: &Region,
        content: &mut impl Read,
        new_len: u64,
    ) -> std::io::Result<()> {
        match region {
            Region::EntireFile => {
                file.rewind()?;
                copy_exact(content, file, new_len)?;
                file.set_len(new_len)?;
            }
            Region::Range(range) => {
                let old_len = range.end - range.start;
                match new_len.cmp(&old_len) {
                    std::cmp::Ordering::Greater => {
                        self.grow(file, range.end, file_len, new_len - old_len)?;
                    }
                    std::cmp::Ordering::Less => {
                        let delta = old_len - new_len;
                        self.shrink(file, range.end, file_len, delta)?;
                        file.set_len(file_len - delta)?;
                    }
                    std::cmp::Ordering::Equal => {}
                }
                file.seek(SeekFrom::Start(range.start))?;
                copy_exact(content, file, new_len)?;
            }
        }
        file.flush()
    }

    /// Shift `[from, file_len)` up by `delta`, starting from the tail
    ///
    /// The first chunk moved is the remainder so later chunks stay aligned to `from`.
    fn grow(
        &self,
        file: &mut std::fs::File,
        from: u64,
        file_len: u64,
        delta: u64,
    ) -> std::io::Result<()> {
        let chunk = self.chunk_size as u64;
        let mut buf = vec![0; self.chunk_size];
        let mut size = match (file_len - from) % chunk {
            0 => chunk,
            rem => rem,
        };
        let mut end = file_len;
        while from < end {
            let len = size.min(end - from);
            let start = end - len;
            let buf = &mut buf[..len as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(buf)?;
            file.seek(SeekFrom::Start(start + delta))?;
            file.write_all(buf)?;
            end = start;
            size = chunk;
        }
        Ok(())
    }

    /// Shift `[from, file_len)` down by `delta`, starting from the head
    fn shrink(
        &self,
        file: &mut std::fs::File,
        from: u64,
        file_len: u64,
        delta: u64,
    ) -> std::io::Result<()> {
        let chunk = self.chunk_size as u64;
        let mut buf = vec![0; self.chunk_size];
        let mut start = from;
        while start < file_len {
            let len = chunk.min(file_len - start);
            let buf = &mut buf[..len as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(buf)?;
            file.seek(SeekFrom::Start(start - delta))?;
            file.write_all(buf)?;
            start += len;
        }
        Ok(())
    }
}

impl Default for Blesser {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_exact(content: &mut impl Read, file: &mut std::fs::File, len: u64) -> std::io::Result<()> {
    let copied = std::io::copy(&mut content.take(len), file)?;
    if copied != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes of content, got {copied}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    const TEXT: &str = "# Doc\n\n```json\nOLD CONTENT\n```\n\nTrailing text that must survive.\n";

    fn fixture(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.md");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn block_region() -> Region {
        let begin = TEXT.find("OLD").unwrap() as u64;
        let end = begin + "OLD CONTENT\n".len() as u64;
        Region::Range(begin..end)
    }

    fn expected_with(replacement: &str) -> String {
        TEXT.replace("OLD CONTENT\n", replacement)
    }

    #[test]
    fn entire_file() {
        let long = "much much longer content than before\n".repeat(300);
        for replacement in ["short\n", long.as_str(), ""] {
            let (_dir, path) = fixture(TEXT);
            bless(&path, &Region::EntireFile, Cursor::new(replacement)).unwrap();
            assert_eq!(std::fs::read_to_string(&path).unwrap(), replacement);
        }
    }

    #[test]
    fn same_length() {
        let (_dir, path) = fixture(TEXT);
        bless(&path, &block_region(), Cursor::new("NEW CONTENT\n")).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            expected_with("NEW CONTENT\n")
        );
    }

    #[test]
    fn grow_region() {
        let replacement = "{\n  \"a\": 1,\n  \"b\": [1, 2, 3]\n}\n";
        for chunk_size in [1, 3, 7, 4096] {
            let (_dir, path) = fixture(TEXT);
            Blesser::new()
                .chunk_size(chunk_size)
                .bless(&path, &block_region(), Cursor::new(replacement))
                .unwrap();
            assert_eq!(
                std::fs::read_to_string(&path).unwrap(),
                expected_with(replacement),
                "chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn shrink_region() {
        for chunk_size in [1, 3, 7, 4096] {
            let (_dir, path) = fixture(TEXT);
            Blesser::new()
                .chunk_size(chunk_size)
                .bless(&path, &block_region(), Cursor::new("{}\n"))
                .unwrap();
            assert_eq!(
                std::fs::read_to_string(&path).unwrap(),
                expected_with("{}\n"),
                "chunk size {chunk_size}"
            );
        }
    }

    #[test]
    fn empty_region() {
        let (_dir, path) = fixture(TEXT);
        let at = TEXT.find("```\n\n").unwrap() as u64;
        bless(&path, &Region::Range(at..at), Cursor::new("inserted\n")).unwrap();
        let mut expected = TEXT.to_owned();
        expected.insert_str(at as usize, "inserted\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn large_tail_is_preserved() {
        let tail: String = (0..5000).map(|i| format!("tail line {i}\n")).collect();
        let text = format!("head\n[region]\n{tail}");
        let begin = "head\n".len() as u64;
        let end = begin + "[region]\n".len() as u64;
        for replacement in ["x\n".to_owned(), "grown\n".repeat(2000)] {
            let (_dir, path) = fixture(&text);
            bless(&path, &Region::Range(begin..end), Cursor::new(&replacement)).unwrap();
            assert_eq!(
                std::fs::read_to_string(&path).unwrap(),
                format!("head\n{replacement}{tail}")
            );
        }
    }

    #[test]
    fn region_outside_file() {
        let (_dir, path) = fixture("short");
        let err = bless(&path, &Region::Range(2..100), Cursor::new("x")).unwrap_err();
        assert!(!err.is_partial());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let err = bless(&path, &Region::EntireFile, Cursor::new("x")).unwrap_err();
        assert!(!err.is_partial());
        assert_eq!(err.path(), path);
        assert!(err.to_string().contains("missing"), "{err}");
    }

    #[test]
    fn bless_then_diff_is_equal() {
        let replacement = "line 1\nline 2\n";
        let (_dir, path) = fixture(TEXT);
        let region = block_region();
        bless(&path, &region, Cursor::new(replacement)).unwrap();

        let updated = std::fs::read(&path).unwrap();
        let begin = TEXT.find("OLD").unwrap();
        let blessed = &updated[begin..begin + replacement.len()];
        let mut report = Vec::new();
        let same = crate::streamdiff::diff(
            &mut report,
            "expected",
            blessed,
            "actual",
            replacement.as_bytes(),
            3,
        )
        .unwrap();
        assert!(same);
        assert!(report.is_empty());
    }
}
