//! Decide whether a file name or a block header describes test content
//!
//! Two strategies are provided:
//! - [`classify_file_name`] for flat files, e.g. `greet.input.@strict.json`
//! - [`classify_info_string`] for fenced blocks, e.g. `json gold:output gold:group=greet`

use std::collections::BTreeMap;

use crate::content::GroupKey;
use crate::content::Role;

/// Namespace for attributes interpreted by the classifier inside block headers
pub const ATTRIBUTE_PREFIX: &str = "gold:";

const INPUT_ATTR: &str = "input";
const OUTPUT_ATTR: &str = "output";
const GROUP_ATTR: &str = "group";
const SKIP_ATTR: &str = "skip";

/// Fields extracted from a name or header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified {
    /// [`Role::None`] means the content has no testing significance
    pub role: Role,
    pub group: GroupKey,
    pub language: String,
    pub attributes: BTreeMap<String, String>,
    pub skip: bool,
}

impl Classified {
    fn ignored() -> Self {
        Self {
            role: Role::None,
            group: GroupKey::Unnamed,
            language: String::new(),
            attributes: BTreeMap::new(),
            skip: false,
        }
    }

    pub fn is_test_content(&self) -> bool {
        self.role != Role::None
    }
}

/// Malformed name or header
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifyError {
    /// Both `input` and `output` were given
    ConflictingRoles,
    /// A flag attribute was given a value
    FlagWithValue { key: String },
    /// A valued attribute was given without one
    MissingValue { key: String },
    /// Namespaced attribute that is not understood
    UnrecognizedAttribute { key: String },
    /// `@` or `@=value` in a file name
    EmptyAttribute { atom: String },
    /// Header could not be tokenized, e.g. an unbalanced quote
    MalformedHeader { header: String },
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConflictingRoles => write!(
                f,
                "only one of `{ATTRIBUTE_PREFIX}{INPUT_ATTR}` and `{ATTRIBUTE_PREFIX}{OUTPUT_ATTR}` may be specified"
            ),
            Self::FlagWithValue { key } => write!(f, "`{key}` attribute must not have a value"),
            Self::MissingValue { key } => write!(f, "`{key}` attribute must have a value"),
            Self::UnrecognizedAttribute { key } => write!(f, "unrecognized attribute `{key}`"),
            Self::EmptyAttribute { atom } => write!(f, "attribute `{atom}` has no name"),
            Self::MalformedHeader { header } => write!(f, "unable to parse header `{header}`"),
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Classify a file by the dot-separated atoms of its name
///
/// - A leading `_` marks the content as skipped
/// - The first atom equal to `input` or `output` (ignoring case) fixes the role
/// - Atoms before it name the group; without any the group is [`GroupKey::Unnamed`]
/// - Atoms after it, except the last, are attributes (`@key=value`, `@flag`; the `@` is
///   optional)
/// - The last atom is the language, unless it is `@`-prefixed
///
/// Names without a role marker are returned with [`Role::None`].
pub fn classify_file_name(name: &str) -> Result<Classified, ClassifyError> {
    let (name, skip) = strip_skip_marker(name);
    let atoms: Vec<&str> = name.split('.').collect();

    let Some((idx, role)) = atoms.iter().enumerate().find_map(|(i, atom)| {
        if atom.eq_ignore_ascii_case(INPUT_ATTR) {
            Some((i, Role::Input))
        } else if atom.eq_ignore_ascii_case(OUTPUT_ATTR) {
            Some((i, Role::Output))
        } else {
            None
        }
    }) else {
        goldbox_macros::debug!("ignoring `{}`: no role marker", name);
        return Ok(Classified::ignored());
    };

    let group = if idx == 0 {
        GroupKey::Unnamed
    } else {
        GroupKey::Named(atoms[..idx].join("."))
    };

    let mut rest = &atoms[idx + 1..];
    let mut language = String::new();
    if let Some((last, init)) = rest.split_last() {
        if !last.starts_with('@') {
            language = (*last).to_owned();
            rest = init;
        }
    }

    let mut attributes = BTreeMap::new();
    for &atom in rest {
        let attr = atom.strip_prefix('@').unwrap_or(atom);
        let (key, value) = attr.split_once('=').unwrap_or((attr, ""));
        if key.is_empty() {
            return Err(ClassifyError::EmptyAttribute {
                atom: atom.to_owned(),
            });
        }
        attributes.insert(key.to_owned(), value.to_owned());
    }

    Ok(Classified {
        role,
        group,
        language,
        attributes,
        skip,
    })
}

/// Strip the leading `_` that marks a file or directory as skipped
pub fn strip_skip_marker(name: &str) -> (&str, bool) {
    match name.strip_prefix('_') {
        Some(rest) => (rest, true),
        None => (name, false),
    }
}

/// Classify a fenced block by its header ("info string")
///
/// The header is a whitespace-separated list of bare tokens and `key=value` pairs (values may
/// be quoted).  A bare first token is the language.  Attributes under [`ATTRIBUTE_PREFIX`]
/// are reserved:
/// - `input` / `output`: flags fixing the role, mutually exclusive
/// - `group=<name>`: correlate with other blocks of the same group
/// - `skip`: flag marking the block skipped
///
/// Any other reserved attribute is an error.  Blocks with neither role flag are returned with
/// [`Role::None`]; they are ordinary code samples.
pub fn classify_info_string(header: &str) -> Result<Classified, ClassifyError> {
    let (language, mut attributes) = parse_info_string(header)?;

    let is_input = extract_flag(&mut attributes, INPUT_ATTR)?;
    let is_output = extract_flag(&mut attributes, OUTPUT_ATTR)?;
    if is_input && is_output {
        return Err(ClassifyError::ConflictingRoles);
    }
    let group = extract_value(&mut attributes, GROUP_ATTR)?;
    let skip = extract_flag(&mut attributes, SKIP_ATTR)?;

    if let Some(key) = attributes.keys().find(|k| k.starts_with(ATTRIBUTE_PREFIX)) {
        return Err(ClassifyError::UnrecognizedAttribute { key: key.clone() });
    }

    let role = if is_input {
        Role::Input
    } else if is_output {
        Role::Output
    } else {
        return Ok(Classified::ignored());
    };

    Ok(Classified {
        role,
        group: group.map(GroupKey::Named).unwrap_or(GroupKey::Anonymous),
        language,
        attributes,
        skip,
    })
}

/// Split a header into its language and attributes
pub fn parse_info_string(
    header: &str,
) -> Result<(String, BTreeMap<String, String>), ClassifyError> {
    let tokens = shlex::split(header).ok_or_else(|| ClassifyError::MalformedHeader {
        header: header.to_owned(),
    })?;

    let mut language = String::new();
    let mut attributes = BTreeMap::new();
    for (i, token) in tokens.into_iter().enumerate() {
        match token.split_once('=') {
            Some((key, value)) => {
                attributes.insert(key.to_owned(), value.to_owned());
            }
            None if i == 0 && !token.starts_with(ATTRIBUTE_PREFIX) => {
                language = token;
            }
            None => {
                attributes.insert(token, String::new());
            }
        }
    }

    Ok((language, attributes))
}

fn extract_flag(attrs: &mut BTreeMap<String, String>, name: &str) -> Result<bool, ClassifyError> {
    let key = format!("{ATTRIBUTE_PREFIX}{name}");
    match attrs.remove(&key) {
        Some(value) if !value.is_empty() => Err(ClassifyError::FlagWithValue { key }),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

fn extract_value(
    attrs: &mut BTreeMap<String, String>,
    name: &str,
) -> Result<Option<String>, ClassifyError> {
    let key = format!("{ATTRIBUTE_PREFIX}{name}");
    match attrs.remove(&key) {
        Some(value) if value.is_empty() => Err(ClassifyError::MissingValue { key }),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}
