//! Discovered fixture content and where it came from

use std::collections::BTreeMap;

/// The part a piece of content plays in a test
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Input,
    Output,
    /// No testing significance, e.g. an unrelated code sample
    None,
}

/// How content is correlated with its counterparts
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    /// Shares a name prefix or an explicit `group` attribute
    Named(String),
    /// Flat file without a name prefix
    ///
    /// All unnamed files within one directory correlate with each other.
    Unnamed,
    /// Document block without a `group` attribute
    ///
    /// Paired with the adjacent block of the opposite role.
    Anonymous,
}

impl GroupKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

/// Byte range of the content within its file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Region {
    /// The content is the whole file
    EntireFile,
    /// Half-open `[begin, end)` span inside a larger file
    Range(std::ops::Range<u64>),
}

impl Region {
    /// `[0, 0)` is the conventional encoding of [`Region::EntireFile`]
    pub fn from_bounds(begin: u64, end: u64) -> Self {
        if begin == 0 && end == 0 {
            Self::EntireFile
        } else {
            Self::Range(begin..end)
        }
    }

    pub fn is_entire_file(&self) -> bool {
        matches!(self, Self::EntireFile)
    }

    pub fn bounds(&self) -> (u64, u64) {
        match self {
            Self::EntireFile => (0, 0),
            Self::Range(range) => (range.start, range.end),
        }
    }
}

/// Where content was loaded from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub file: std::path::PathBuf,
    /// 1-based line the content starts on, `None` for whole files
    pub line: Option<usize>,
    pub region: Region,
}

impl Location {
    pub fn file(file: impl Into<std::path::PathBuf>) -> Self {
        Self {
            file: file.into(),
            line: None,
            region: Region::EntireFile,
        }
    }

    pub fn block(
        file: impl Into<std::path::PathBuf>,
        line: usize,
        span: std::ops::Range<u64>,
    ) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            region: Region::Range(span),
        }
    }

    /// File name without its directories
    pub fn file_name(&self) -> std::borrow::Cow<'_, str> {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.file.to_string_lossy())
    }

    /// Like [`Display`][std::fmt::Display] but with only the file name
    pub fn short(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file_name(), line),
            None => self.file_name().into_owned(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
        }
        Ok(())
    }
}

/// A classified input or output, produced once per scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentItem {
    pub role: Role,
    pub group: GroupKey,
    /// Language tag, e.g. `json`; empty for plain text
    pub language: String,
    pub attributes: BTreeMap<String, String>,
    /// Heading or title the content appeared under, if any
    pub caption: Option<String>,
    pub skip: bool,
    pub location: Location,
    pub payload: Vec<u8>,
}

impl ContentItem {
    pub fn new(
        role: Role,
        group: GroupKey,
        location: Location,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            role,
            group,
            language: String::new(),
            attributes: BTreeMap::new(),
            caption: None,
            skip: false,
            location,
            payload: payload.into(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn metadata(&self) -> Metadata<'_> {
        Metadata { item: self }
    }
}

/// Read-only view of what a generator may know about content
#[derive(Copy, Clone, Debug)]
pub struct Metadata<'i> {
    item: &'i ContentItem,
}

impl<'i> Metadata<'i> {
    pub fn language(&self) -> &'i str {
        &self.item.language
    }

    pub fn attributes(&self) -> &'i BTreeMap<String, String> {
        &self.item.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&'i str> {
        self.item.attributes.get(key).map(String::as_str)
    }

    pub fn location(&self) -> &'i Location {
        &self.item.location
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_bounds_mean_entire_file() {
        assert_eq!(Region::from_bounds(0, 0), Region::EntireFile);
        assert_eq!(Region::from_bounds(0, 4), Region::Range(0..4));
        assert_eq!(Region::from_bounds(10, 10), Region::Range(10..10));
        assert_eq!(Region::EntireFile.bounds(), (0, 0));
    }

    #[test]
    fn location_display() {
        let path = std::path::Path::new("cases").join("greet.output.json");
        let whole = Location::file(&path);
        assert_eq!(whole.to_string(), path.display().to_string());
        assert_eq!(whole.short(), "greet.output.json");

        let block = Location::block("doc.md", 12, 40..52);
        assert_eq!(block.to_string(), "doc.md:12");
        assert_eq!(block.short(), "doc.md:12");
    }
}
