//! Hierarchy of named, skip-aware tests ending in assertions

use crate::content::ContentItem;

/// Expect `output` to be produced from `input`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    pub input: ContentItem,
    pub output: ContentItem,
}

/// A (possibly nested) test
///
/// `skip` is the node's own status only.  Whether a node actually runs also depends on its
/// ancestors; see [`TestNode::cases`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestNode {
    pub name: String,
    pub skip: bool,
    pub children: Vec<TestNode>,
    pub assertion: Option<Assertion>,
}

impl TestNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TestNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertion = Some(assertion);
        self
    }

    /// Neither children nor an assertion
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.assertion.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.assertion.is_some()
    }

    /// Look up a direct child by name
    pub fn child(&self, name: &str) -> Option<&TestNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every assertion in the tree, depth-first, in declaration order
    ///
    /// A node's children come before its own assertion.  Each case's `skip` is the node's own
    /// status OR-ed with that of every ancestor.
    pub fn cases(&self) -> Vec<Case<'_>> {
        let mut cases = Vec::new();
        let mut path = Vec::new();
        self.collect_cases(&mut path, false, &mut cases);
        cases
    }

    fn collect_cases<'t>(
        &'t self,
        path: &mut Vec<&'t str>,
        inherited_skip: bool,
        cases: &mut Vec<Case<'t>>,
    ) {
        let skip = inherited_skip || self.skip;
        path.push(&self.name);
        for child in &self.children {
            child.collect_cases(path, skip, cases);
        }
        if let Some(assertion) = &self.assertion {
            cases.push(Case {
                path: path.clone(),
                skip,
                assertion,
            });
        }
        path.pop();
    }

    /// Number of assertions in the tree
    pub fn len(&self) -> usize {
        self.children.iter().map(TestNode::len).sum::<usize>()
            + usize::from(self.assertion.is_some())
    }
}

/// Outline of the tree, one node per line
///
/// ```text
/// testdata
///   greet: greet.input.json -> greet.output.json
///   matrix
///     json -> yaml: in.json -> out.yaml (skipped)
/// ```
impl std::fmt::Display for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.render(f, 0)
    }
}

impl TestNode {
    fn render(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = depth * 2)?;
        if let Some(assertion) = &self.assertion {
            write!(
                f,
                ": {} -> {}",
                assertion.input.location.short(),
                assertion.output.location.short()
            )?;
        }
        if self.skip {
            write!(f, " (skipped)")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

/// A runnable assertion with its position in the tree
#[derive(Clone, Debug)]
pub struct Case<'t> {
    pub skip: bool,
    pub assertion: &'t Assertion,
    path: Vec<&'t str>,
}

impl<'t> Case<'t> {
    /// Names from the root down to the node holding the assertion
    pub fn path(&self) -> &[&'t str] {
        &self.path
    }

    /// `/`-joined [`Case::path`]
    pub fn name(&self) -> String {
        self.path.join("/")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::content::{GroupKey, Location, Role};

    fn assertion(name: &str) -> Assertion {
        Assertion {
            input: ContentItem::new(
                Role::Input,
                GroupKey::named(name),
                Location::file(format!("{name}.input")),
                "in",
            ),
            output: ContentItem::new(
                Role::Output,
                GroupKey::named(name),
                Location::file(format!("{name}.output")),
                "out",
            ),
        }
    }

    #[test]
    fn cases_propagate_ancestor_skip() {
        let tree = TestNode::new("root").with_children([
            TestNode::new("a").with_assertion(assertion("a")),
            TestNode::new("dir").with_skip(true).with_children([
                TestNode::new("b").with_assertion(assertion("b")),
            ]),
        ]);

        let cases = tree.cases();
        let summary: Vec<_> = cases.iter().map(|c| (c.name(), c.skip)).collect();
        assert_eq!(
            summary,
            [("root/a".to_owned(), false), ("root/dir/b".to_owned(), true)]
        );
        assert!(!tree.child("dir").unwrap().children[0].skip);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn children_run_before_own_assertion() {
        let tree = TestNode::new("root")
            .with_assertion(assertion("own"))
            .with_children([TestNode::new("child").with_assertion(assertion("child"))]);

        let names: Vec<_> = tree.cases().iter().map(Case::name).collect();
        assert_eq!(names, ["root/child", "root"]);
    }

    #[test]
    fn empty_and_leaf() {
        assert!(TestNode::new("x").is_empty());
        let leaf = TestNode::new("x").with_assertion(assertion("x"));
        assert!(leaf.is_leaf());
        assert!(!leaf.is_empty());
    }

    #[test]
    fn render_outline() {
        let tree = TestNode::new("root").with_children([TestNode::new("dir")
            .with_skip(true)
            .with_children([TestNode::new("b").with_assertion(assertion("b"))])]);
        let expected = "\
root
  dir (skipped)
    b: b.input -> b.output
";
        assert_eq!(tree.to_string(), expected);
    }
}
