//! Build a [`TestNode`] tree from fixtures on disk
//!
//! A directory is a scope.  Within it:
//! - Dot-prefixed entries are ignored
//! - Sub-directories are scopes of their own
//! - Documents (by default `*.md` files without a role marker) are scopes of their own, with
//!   fenced blocks as content
//! - Every other file is classified by name, see [`classify_file_name`]
//!
//! Sub-scopes come first, in file-name order, followed by the scope's correlated groups in
//! natural order.  Scopes that produce no tests are dropped.

pub mod document;

use std::path::Path;
use std::path::PathBuf;

use crate::classify::classify_file_name;
use crate::classify::classify_info_string;
use crate::classify::strip_skip_marker;
use crate::classify::ClassifyError;
use crate::content::ContentItem;
use crate::content::Location;
use crate::correlate::Correlator;
use crate::tree::TestNode;

pub use document::DocumentParser;
pub use document::Markdown;

/// Malformed or inconsistent fixtures
///
/// Any of these aborts the whole load: a broken fixture never yields a smaller test tree.
#[derive(Debug)]
pub enum LoadError {
    /// A file name or block header could not be classified
    Classify {
        location: Location,
        source: ClassifyError,
    },
    /// Output with no input to generate it from
    NoInputs { output: Location },
    /// Input with no output to compare against
    NoOutputs { input: Location },
    /// Failed to list a directory or read a file
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Document is not UTF-8
    InvalidDocument { path: PathBuf },
}

impl LoadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classify { location, source } => write!(f, "{location}: {source}"),
            Self::NoInputs { output } => {
                write!(f, "output loaded from {output} has no associated input")
            }
            Self::NoOutputs { input } => {
                write!(f, "input loaded from {input} has no associated output")
            }
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::InvalidDocument { path } => {
                write!(f, "{} is not valid UTF-8", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Classify { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

type Filter = dyn Fn(&Path, bool) -> bool;

/// Discover tests under a directory
///
/// ```rust,no_run
/// let tree = goldbox::load::Loader::new()
///     .recursive(true)
///     .load("tests/fixtures")
///     .unwrap();
/// println!("{tree}");
/// ```
pub struct Loader {
    recursive: bool,
    parser: Box<dyn DocumentParser>,
    document_extension: String,
    filter: Option<Box<Filter>>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            recursive: true,
            parser: Box::new(Markdown),
            document_extension: "md".to_owned(),
            filter: None,
        }
    }

    /// Descend into sub-directories (default `true`)
    pub fn recursive(mut self, yes: bool) -> Self {
        self.recursive = yes;
        self
    }

    /// Parser for structured documents (default [`Markdown`])
    pub fn parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Extension identifying structured documents (default `md`)
    pub fn document_extension(mut self, extension: impl Into<String>) -> Self {
        self.document_extension = extension.into();
        self
    }

    /// Only consider entries for which `filter(path, is_dir)` is `true`
    pub fn filter(mut self, filter: impl Fn(&Path, bool) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Load a directory, or a single document
    ///
    /// The returned root is kept even when empty.
    pub fn load(&self, root: impl AsRef<Path>) -> Result<TestNode, LoadError> {
        let root = root.as_ref();
        let metadata = std::fs::metadata(root).map_err(|e| LoadError::io(root, e))?;
        if metadata.is_dir() {
            self.load_dir(root)
        } else {
            self.load_document(root)
        }
    }

    fn load_dir(&self, dir: &Path) -> Result<TestNode, LoadError> {
        let (name, skip) = scope_name(dir);
        goldbox_macros::debug!("loading directory {}", dir.display());

        let mut children = Vec::new();
        let mut correlator = Correlator::new();
        let entries = walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        for entry in entries {
            let entry = entry.map_err(|e| LoadError::io(dir, e.into()))?;
            let file_name = entry.file_name().to_string_lossy();
            if file_name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            let is_dir = entry.file_type().is_dir();
            if let Some(filter) = &self.filter {
                if !filter(path, is_dir) {
                    goldbox_macros::debug!("filtered out {}", path.display());
                    continue;
                }
            }

            if is_dir {
                if self.recursive {
                    push_non_empty(&mut children, self.load_dir(path)?);
                }
            } else if self.is_document(path, &file_name) {
                push_non_empty(&mut children, self.load_document(path)?);
            } else {
                self.load_file(path, &file_name, &mut correlator)?;
            }
        }
        children.extend(correlator.build()?.into_iter().filter(|t| !t.is_empty()));

        Ok(TestNode::new(name).with_skip(skip).with_children(children))
    }

    /// A document has the document extension and no role marker of its own
    ///
    /// `notes.input.md` is a flat input that happens to be Markdown.
    fn is_document(&self, path: &Path, file_name: &str) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.document_extension))
            && classify_file_name(file_name).is_ok_and(|c| !c.is_test_content())
    }

    fn load_file(
        &self,
        path: &Path,
        file_name: &str,
        correlator: &mut Correlator,
    ) -> Result<(), LoadError> {
        let classified = classify_file_name(file_name).map_err(|source| LoadError::Classify {
            location: Location::file(path),
            source,
        })?;
        if !classified.is_test_content() {
            return Ok(());
        }

        let payload = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        let mut item = ContentItem::new(
            classified.role,
            classified.group,
            Location::file(path),
            payload,
        )
        .with_language(classified.language)
        .with_skip(classified.skip);
        item.attributes = classified.attributes;
        correlator.add(item)
    }

    fn load_document(&self, path: &Path) -> Result<TestNode, LoadError> {
        goldbox_macros::debug!("loading document {}", path.display());
        let raw = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        let source = String::from_utf8(raw).map_err(|_| LoadError::InvalidDocument {
            path: path.to_owned(),
        })?;

        let mut title = None;
        let mut caption: Option<&str> = None;
        let mut correlator = Correlator::new();
        for (i, node) in self.parser.parse(&source).into_iter().enumerate() {
            match node {
                document::Node::Heading(heading) => {
                    if heading.level == 1 {
                        title = (i == 0).then_some(heading.text);
                    }
                    caption = Some(heading.text);
                }
                document::Node::Paragraph(_) => {}
                document::Node::Block(block) => {
                    let location = Location::block(
                        path,
                        block.line,
                        block.span.start as u64..block.span.end as u64,
                    );
                    let classified = match classify_info_string(block.header) {
                        Ok(classified) => classified,
                        Err(source) => return Err(LoadError::Classify { location, source }),
                    };
                    if !classified.is_test_content() {
                        continue;
                    }

                    let mut item = ContentItem::new(
                        classified.role,
                        classified.group,
                        location,
                        block.text.as_bytes(),
                    )
                    .with_language(classified.language)
                    .with_skip(classified.skip);
                    item.attributes = classified.attributes;
                    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
                        item = item.with_caption(caption);
                    }
                    correlator.add(item)?;
                }
            }
        }

        let (stem, skip) = document_name(path);
        let name = title.filter(|t| !t.is_empty()).unwrap_or(stem.as_str());
        Ok(TestNode::new(name)
            .with_skip(skip)
            .with_children(correlator.build()?.into_iter().filter(|t| !t.is_empty())))
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load `root` with the default [`Loader`]
pub fn load(root: impl AsRef<Path>) -> Result<TestNode, LoadError> {
    Loader::new().load(root)
}

fn push_non_empty(children: &mut Vec<TestNode>, node: TestNode) {
    if node.is_empty() {
        goldbox_macros::debug!("dropping empty scope {}", node.name);
    } else {
        children.push(node);
    }
}

fn scope_name(path: &Path) -> (String, bool) {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let (name, skip) = strip_skip_marker(&base);
    (name.to_owned(), skip)
}

fn document_name(path: &Path) -> (String, bool) {
    let (name, skip) = scope_name(path);
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_owned(),
        _ => name,
    };
    (stem, skip)
}

#[cfg(test)]
mod test {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn names(node: &TestNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn scopes_before_groups() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "b.input.txt", "in");
        write(root.path(), "b.output.txt", "out");
        write(root.path(), "a.input.txt", "in");
        write(root.path(), "a.output.txt", "out");
        write(root.path(), "sub/c.input.txt", "in");
        write(root.path(), "sub/c.output.txt", "out");
        write(root.path(), "README.txt", "not a fixture");

        let tree = load(root.path()).unwrap();
        assert_eq!(names(&tree), ["sub", "a", "b"]);
        assert_eq!(names(&tree.children[0]), ["c"]);
    }

    #[test]
    fn hidden_and_empty_scopes_are_dropped() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), ".hidden/a.input.txt", "in");
        write(root.path(), ".b.input.txt", "in");
        write(root.path(), "empty/notes.txt", "");
        write(root.path(), "c.input.txt", "in");
        write(root.path(), "c.output.txt", "out");

        let tree = load(root.path()).unwrap();
        assert_eq!(names(&tree), ["c"]);
    }

    #[test]
    fn skipped_directory() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "_wip/a.input.txt", "in");
        write(root.path(), "_wip/a.output.txt", "out");

        let tree = load(root.path()).unwrap();
        let wip = tree.child("wip").unwrap();
        assert!(wip.skip);
        assert!(!wip.children[0].skip);
        assert!(tree.cases()[0].skip);
    }

    #[test]
    fn non_recursive() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "sub/a.input.txt", "in");
        write(root.path(), "sub/a.output.txt", "out");
        write(root.path(), "b.input.txt", "in");
        write(root.path(), "b.output.txt", "out");

        let tree = Loader::new().recursive(false).load(root.path()).unwrap();
        assert_eq!(names(&tree), ["b"]);
    }

    #[test]
    fn filter_entries() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "a.input.txt", "in");
        write(root.path(), "a.output.txt", "out");
        write(root.path(), "b.input.txt", "in");
        write(root.path(), "b.output.txt", "out");

        let tree = Loader::new()
            .filter(|path, _| !path.to_string_lossy().contains("b."))
            .load(root.path())
            .unwrap();
        assert_eq!(names(&tree), ["a"]);
    }

    #[test]
    fn payload_and_attributes() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "g.input.@strict.json", "{}");
        write(root.path(), "g.output.json", "{}\n");

        let tree = load(root.path()).unwrap();
        let assertion = tree.children[0].assertion.as_ref().unwrap();
        assert_eq!(assertion.input.payload, b"{}");
        assert_eq!(assertion.input.attributes["strict"], "");
        assert_eq!(assertion.input.language, "json");
        assert!(assertion.output.attributes.is_empty());
        assert!(assertion.output.location.region.is_entire_file());
    }

    #[test]
    fn document_blocks() {
        let root = tempfile::tempdir().unwrap();
        let doc = "\
# Pretty printing

```json gold:input
{\"a\":1}
```

```json gold:output
{
  \"a\": 1
}
```

```sh
echo not a test
```
";
        write(root.path(), "pretty.md", doc);

        let tree = load(root.path()).unwrap();
        let doc_node = &tree.children[0];
        assert_eq!(doc_node.name, "Pretty printing");
        assert_eq!(names(doc_node), ["anonymous test on line 7"]);
        let assertion = doc_node.children[0].assertion.as_ref().unwrap();
        assert_eq!(assertion.input.payload, b"{\"a\":1}\n");
        assert_eq!(assertion.input.location.line, Some(3));
        assert_eq!(assertion.input.caption.as_deref(), Some("Pretty printing"));
        let (begin, end) = assertion.output.location.region.bounds();
        assert_eq!(&doc.as_bytes()[begin as usize..end as usize], b"{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn document_without_title_uses_stem() {
        let root = tempfile::tempdir().unwrap();
        let doc = "\
Intro

# One

```txt gold:input gold:group=g
a
```

# Two

```txt gold:output gold:group=g
a
```
";
        write(root.path(), "_cases.md", doc);

        let tree = load(root.path()).unwrap();
        let doc_node = &tree.children[0];
        assert_eq!(doc_node.name, "cases");
        assert!(doc_node.skip);
        assert_eq!(names(doc_node), ["g"]);
    }

    #[test]
    fn heading_after_prose_is_not_a_title() {
        let root = tempfile::tempdir().unwrap();
        let doc = "\
Some introductory prose.

# Section

```txt gold:input
a
```

```txt gold:output
a
```
";
        write(root.path(), "cases.md", doc);

        let tree = load(root.path()).unwrap();
        assert_eq!(names(&tree), ["cases"]);
        let assertion = tree.children[0].children[0].assertion.as_ref().unwrap();
        assert_eq!(assertion.output.caption.as_deref(), Some("Section"));
    }

    #[test]
    fn setext_title() {
        let root = tempfile::tempdir().unwrap();
        let doc = "\
Greetings
=========

```txt gold:input
a
```

```txt gold:output
a
```
";
        write(root.path(), "cases.md", doc);

        let tree = load(root.path()).unwrap();
        assert_eq!(names(&tree), ["Greetings"]);
    }

    #[test]
    fn markdown_with_role_marker_is_flat() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "notes.input.md", "# In\n");
        write(root.path(), "notes.output.md", "# Out\n");

        let tree = load(root.path()).unwrap();
        assert_eq!(names(&tree), ["notes"]);
        assert!(tree.children[0].is_leaf());
    }

    #[test]
    fn bad_header_reports_block_location() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "doc.md", "text\n\n```json gold:inptu\n{}\n```\n");

        let err = load(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::Classify { .. }));
        assert!(err.to_string().contains("doc.md:3"), "{err}");
        assert!(err.to_string().contains("gold:inptu"), "{err}");
    }

    #[test]
    fn error_aborts_whole_tree() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "good/a.input.txt", "in");
        write(root.path(), "good/a.output.txt", "out");
        write(root.path(), "bad/lonely.output.txt", "out");

        let err = load(root.path()).unwrap_err();
        assert!(err.to_string().contains("lonely.output.txt"), "{err}");
    }

    #[test]
    fn missing_root() {
        let root = tempfile::tempdir().unwrap();
        let err = load(root.path().join("missing")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
