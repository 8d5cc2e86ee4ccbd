//! Pair inputs with outputs and shape them into tests

use std::collections::BTreeMap;

use crate::content::{ContentItem, GroupKey, Role};
use crate::load::LoadError;
use crate::tree::{Assertion, TestNode};

/// Inputs and outputs that are checked against each other
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub inputs: Vec<ContentItem>,
    pub outputs: Vec<ContentItem>,
}

impl Group {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn push(&mut self, item: ContentItem) {
        match item.role {
            Role::Input => self.inputs.push(item),
            Role::Output => self.outputs.push(item),
            Role::None => {}
        }
    }

    /// Finalize into a single assertion or a matrix of them
    pub fn build(self) -> Result<TestNode, LoadError> {
        let Self {
            name,
            mut inputs,
            mut outputs,
        } = self;
        match (inputs.len(), outputs.len()) {
            (0, 0) => Ok(TestNode::new(name)),
            (0, _) => Err(LoadError::NoInputs {
                output: outputs.swap_remove(0).location,
            }),
            (_, 0) => Err(LoadError::NoOutputs {
                input: inputs.swap_remove(0).location,
            }),
            (1, 1) => {
                let input = inputs.remove(0);
                let output = outputs.remove(0);
                Ok(TestNode::new(name)
                    .with_skip(input.skip || output.skip)
                    .with_assertion(Assertion { input, output }))
            }
            _ => Ok(build_matrix(name, &inputs, &outputs)),
        }
    }
}

fn build_matrix(name: String, inputs: &[ContentItem], outputs: &[ContentItem]) -> TestNode {
    let pairs: Vec<(&ContentItem, &ContentItem)> = outputs
        .iter()
        .flat_map(|output| inputs.iter().map(move |input| (input, output)))
        .collect();

    let mut names: Vec<String> = pairs
        .iter()
        .map(|(input, output)| matrix_name(input, output))
        .collect();
    let mut counts = BTreeMap::new();
    for name in &names {
        *counts.entry(name.clone()).or_insert(0usize) += 1;
    }
    for (name, (input, output)) in names.iter_mut().zip(&pairs) {
        if counts[name.as_str()] > 1 {
            *name = location_name(input, output);
        }
    }

    let children = names
        .into_iter()
        .zip(pairs)
        .map(|(child, (input, output))| {
            TestNode::new(child)
                .with_skip(input.skip || output.skip)
                .with_assertion(Assertion {
                    input: input.clone(),
                    output: output.clone(),
                })
        });
    TestNode::new(name).with_children(children)
}

/// Name one cell of a matrix, by the first rule that tells the pair apart
///
/// 1. Differing captions
/// 2. Differing languages
/// 3. The input's line, when both live in the same file
/// 4. Both locations
fn matrix_name(input: &ContentItem, output: &ContentItem) -> String {
    if let (Some(i), Some(o)) = (&input.caption, &output.caption) {
        if i != o {
            return format!("{i} -> {o}");
        }
    }
    if !input.language.is_empty()
        && !output.language.is_empty()
        && input.language != output.language
    {
        return format!("{} -> {}", input.language, output.language);
    }
    if input.location.file == output.location.file {
        if let Some(line) = input.location.line {
            return format!("line {line}");
        }
    }
    location_name(input, output)
}

fn location_name(input: &ContentItem, output: &ContentItem) -> String {
    format!("{} -> {}", input.location.short(), output.location.short())
}

/// Collects classified content for one scope and partitions it into [`Group`]s
///
/// Items are keyed by their [`GroupKey`]:
/// - [`GroupKey::Named`] items join the group of that name
/// - [`GroupKey::Unnamed`] items all join one group for the scope
/// - [`GroupKey::Anonymous`] items pair with the next item of the opposite role; at most one
///   item is ever pending
#[derive(Debug, Default)]
pub struct Correlator {
    groups: Vec<Group>,
    index: BTreeMap<GroupKey, usize>,
    pending: Option<ContentItem>,
}

impl Correlator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add one item; [`Role::None`] items are ignored
    pub fn add(&mut self, item: ContentItem) -> Result<(), LoadError> {
        if item.role == Role::None {
            return Ok(());
        }
        match item.group {
            GroupKey::Anonymous => self.add_anonymous(item),
            _ => {
                self.check_pending()?;
                self.group(&item).push(item);
                Ok(())
            }
        }
    }

    fn add_anonymous(&mut self, item: ContentItem) -> Result<(), LoadError> {
        let Some(pending) = self.pending.take() else {
            self.pending = Some(item);
            return Ok(());
        };
        let (input, output) = match (pending.role, item.role) {
            (Role::Input, Role::Output) => (pending, item),
            (Role::Output, Role::Input) => (item, pending),
            _ => {
                self.pending = Some(pending);
                return self.check_pending();
            }
        };
        let name = match output.location.line {
            Some(line) => format!("anonymous test on line {line}"),
            None => format!("anonymous test in {}", output.location.file_name()),
        };
        let mut group = Group::new(name);
        group.push(input);
        group.push(output);
        self.groups.push(group);
        Ok(())
    }

    /// Fail if an anonymous item is still waiting for its counterpart
    fn check_pending(&self) -> Result<(), LoadError> {
        match &self.pending {
            Some(item) if item.role == Role::Input => Err(LoadError::NoOutputs {
                input: item.location.clone(),
            }),
            Some(item) => Err(LoadError::NoInputs {
                output: item.location.clone(),
            }),
            None => Ok(()),
        }
    }

    fn group(&mut self, item: &ContentItem) -> &mut Group {
        let idx = match self.index.get(&item.group) {
            Some(idx) => *idx,
            None => {
                let name = match &item.group {
                    GroupKey::Named(name) => name.clone(),
                    _ => format!("anonymous test in {}", item.location.file_name()),
                };
                self.groups.push(Group::new(name));
                self.index.insert(item.group.clone(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    /// Finalize every group, sorted naturally by name
    pub fn build(self) -> Result<Vec<TestNode>, LoadError> {
        self.check_pending()?;
        let mut tests = self
            .groups
            .into_iter()
            .map(Group::build)
            .collect::<Result<Vec<_>, _>>()?;
        tests.sort_by(|a, b| crate::utils::natural_cmp(&a.name, &b.name));
        Ok(tests)
    }
}
