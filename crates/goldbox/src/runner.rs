//! Execute assertions: generate, compare, and optionally bless
//!
//! Each assertion runs as:
//! 1. The generator writes actual output for the input into a temporary file
//! 2. The expectation is compared against it with [`StreamDiff`]
//! 3. On a difference, the expectation is rewritten when the [`Action`] is
//!    [`Action::Overwrite`]
//!
//! Tests run one at a time, in tree order.  Blessing rewrites fixture files, so two
//! assertions touching the same file must never overlap.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Read as _;
use std::io::Seek as _;
use std::io::SeekFrom;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::action::Action;
use crate::action::DEFAULT_ACTION_ENV;
use crate::content::ContentItem;
use crate::content::Metadata;
use crate::content::Region;
use crate::report::Palette;
use crate::streamdiff::StreamDiff;
use crate::streamdiff::DEFAULT_CONTEXT_LINES;
use crate::tree::Assertion;
use crate::tree::Case;
use crate::tree::TestNode;
use crate::Error;

/// Run-wide settings
#[derive(Clone, Debug)]
pub struct Config {
    pub action: Action,
    /// Environment variable named in the hint shown on failure
    pub action_env: Option<String>,
    pub context_lines: usize,
    /// Only run assertions where the input or output has this language
    pub language: Option<String>,
    pub palette: Palette,
}

impl Config {
    pub fn new() -> Self {
        Self {
            action: Action::Verify,
            action_env: Some(DEFAULT_ACTION_ENV.to_owned()),
            context_lines: DEFAULT_CONTEXT_LINES,
            language: None,
            palette: Palette::auto(),
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self.action_env = None;
        self
    }

    /// Read the [`Action`] from an environment variable, defaulting to [`Action::Verify`]
    pub fn action_env(mut self, var_name: &str) -> Self {
        self.action = Action::with_env_var(var_name).unwrap_or_default();
        self.action_env = Some(var_name.to_owned());
        self
    }

    pub fn context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.is_empty());
        self
    }

    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Whether `assertion` passes the language filter
    pub fn selects(&self, assertion: &Assertion) -> bool {
        match &self.language {
            Some(language) => [&assertion.input, &assertion.output]
                .iter()
                .any(|item| item.language.eq_ignore_ascii_case(language)),
            None => true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Content handed to a [`Generator`]
#[derive(Copy, Clone, Debug)]
pub struct Input<'i> {
    item: &'i ContentItem,
}

impl<'i> Input<'i> {
    pub fn bytes(&self) -> &'i [u8] {
        &self.item.payload
    }

    pub fn to_str(&self) -> Result<&'i str, Error> {
        std::str::from_utf8(&self.item.payload)
            .map_err(|e| Error::new(e).context(format!("input from {}", self.item.location)))
    }

    pub fn metadata(&self) -> Metadata<'i> {
        self.item.metadata()
    }
}

/// Produces the actual output for an input
///
/// `output` describes the expectation the result will be compared against, e.g. so the
/// output language can select a format.  Implemented for matching closures and functions.
pub trait Generator {
    fn generate(
        &self,
        input: Input<'_>,
        output: Metadata<'_>,
        actual: &mut dyn Write,
    ) -> Result<(), Error>;
}

impl<F> Generator for F
where
    F: Fn(Input<'_>, Metadata<'_>, &mut dyn Write) -> Result<(), Error>,
{
    fn generate(
        &self,
        input: Input<'_>,
        output: Metadata<'_>,
        actual: &mut dyn Write,
    ) -> Result<(), Error> {
        (self)(input, output, actual)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => "ok",
            Self::Fail => "failed",
            Self::Skip => "skipped",
        }
        .fmt(f)
    }
}

/// Result of [`Runner::check`]
#[derive(Clone, Debug)]
pub struct Verdict {
    pub outcome: Outcome,
    /// The input, then the matching output or the difference
    pub log: String,
    /// The expectation was rewritten to match
    pub blessed: bool,
}

impl Verdict {
    fn new(outcome: Outcome, log: String) -> Self {
        Self {
            outcome,
            log,
            blessed: false,
        }
    }
}

/// Result of one assertion
#[derive(Clone, Debug)]
pub struct Report {
    pub name: String,
    pub outcome: Outcome,
    /// The input, then the matching output or the difference
    pub log: String,
    pub duration: std::time::Duration,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = std::time::Duration::from_millis(self.duration.as_millis() as u64);
        writeln!(
            f,
            "Testing {} ... {} ({})",
            self.name,
            self.outcome,
            humantime::format_duration(duration)
        )?;
        if self.outcome == Outcome::Fail {
            write!(f, "{}", self.log)?;
        }
        Ok(())
    }
}

pub struct Runner<G> {
    generator: G,
    config: Config,
    /// Length changes made by blessing, so later regions in the same file can be found
    edits: Mutex<BTreeMap<PathBuf, Vec<Edit>>>,
}

/// A blessed region, in the coordinates the file was loaded with
#[derive(Copy, Clone, Debug)]
struct Edit {
    end: u64,
    delta: i64,
}

impl<G: Generator> Runner<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, Config::new())
    }

    pub fn with_config(generator: G, config: Config) -> Self {
        Self {
            generator,
            config,
            edits: Default::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every assertion in `tree`, in order
    pub fn run(&self, tree: &TestNode) -> Vec<Report> {
        tree.cases()
            .iter()
            .map(|case| self.run_case(case))
            .collect()
    }

    pub fn run_case(&self, case: &Case<'_>) -> Report {
        let start = std::time::Instant::now();
        let name = case.name();
        let (outcome, log) = if case.skip || self.config.action == Action::Skip {
            (Outcome::Skip, String::new())
        } else if !self.config.selects(case.assertion) {
            let log = format!(
                "{}\n",
                self.config.palette.hint(format_args!(
                    "no {} content",
                    self.config.language.as_deref().unwrap_or_default()
                ))
            );
            (Outcome::Skip, log)
        } else {
            let Verdict { outcome, log, .. } = self.check(case.assertion);
            (outcome, log)
        };
        goldbox_macros::debug!("{} ... {}", name, outcome);
        Report {
            name,
            outcome,
            log,
            duration: start.elapsed(),
        }
    }

    /// Compare (and maybe bless) a single assertion
    pub fn check(&self, assertion: &Assertion) -> Verdict {
        let palette = self.config.palette;
        let Assertion { input, output } = assertion;
        let mut log = String::new();

        let _ = writeln!(log, "{} {}", palette.section("INPUT"), palette.hint(&input.location));
        write_payload(&mut log, &input.payload);

        let mut actual = match self.generate(input, output) {
            Ok(actual) => actual,
            Err(err) => {
                let _ = writeln!(log, "{}: {}", palette.error("Failed to generate output"), err);
                return Verdict::new(Outcome::Fail, log);
            }
        };

        let mut diff = Vec::new();
        let same = actual.rewind().map_err(Error::from).and_then(|()| {
            StreamDiff::new()
                .context_lines(self.config.context_lines)
                .palette(palette)
                .diff(
                    &mut diff,
                    &output.location,
                    &output.payload[..],
                    "actual output",
                    std::io::BufReader::new(actual.as_file_mut()),
                )
                .map_err(Error::from)
        });
        let same = match same {
            Ok(same) => same,
            Err(err) => {
                let _ = writeln!(log, "{}: {}", palette.error("Failed to compare output"), err);
                return Verdict::new(Outcome::Fail, log);
            }
        };

        if same {
            let _ = writeln!(
                log,
                "{} {}",
                palette.section("OUTPUT"),
                palette.hint(&output.location)
            );
            write_payload(&mut log, &output.payload);
            return Verdict::new(Outcome::Pass, log);
        }

        let _ = writeln!(log, "{}", palette.section("OUTPUT DIFF"));
        log.push_str(&String::from_utf8_lossy(&diff));

        match self.config.action {
            Action::Overwrite => match self.bless_output(output, &mut actual) {
                Ok(()) => {
                    let _ = writeln!(log, "{} {}", palette.warn("Blessed"), output.location);
                    Verdict {
                        outcome: Outcome::Pass,
                        log,
                        blessed: true,
                    }
                }
                Err(err) => {
                    let _ = writeln!(log, "{}: {}", palette.error("Failed to bless"), err);
                    keep_actual(actual, &mut log, palette);
                    Verdict::new(Outcome::Fail, log)
                }
            },
            Action::Ignore => {
                let _ = writeln!(log, "{}", palette.warn("Ignoring above failure"));
                Verdict::new(Outcome::Pass, log)
            }
            Action::Verify | Action::Skip => {
                keep_actual(actual, &mut log, palette);
                if let Some(var) = self.config.action_env.as_deref() {
                    let _ = writeln!(
                        log,
                        "{}",
                        palette.hint(format_args!("Update with {var}=overwrite"))
                    );
                }
                Verdict::new(Outcome::Fail, log)
            }
        }
    }

    /// Capture the generator's output in a temporary file
    fn generate(
        &self,
        input: &ContentItem,
        output: &ContentItem,
    ) -> Result<tempfile::NamedTempFile, Error> {
        let mut actual = tempfile::Builder::new()
            .prefix("goldbox-")
            .tempfile()
            .map_err(|e| Error::new(e).context("creating temporary file"))?;
        {
            let mut writer = std::io::BufWriter::new(actual.as_file_mut());
            self.generator
                .generate(Input { item: input }, output.metadata(), &mut writer)?;
            writer.flush()?;
        }
        if !output.location.region.is_entire_file() {
            terminate_line(actual.as_file_mut())?;
        }
        Ok(actual)
    }
}

impl<G> Runner<G> {
    /// Replace the expectation with `actual`
    ///
    /// A region is shifted by the blesses already made earlier in its file, then checked to
    /// still hold the content it was loaded with.
    fn bless_output(
        &self,
        output: &ContentItem,
        actual: &mut tempfile::NamedTempFile,
    ) -> Result<(), Error> {
        let path = &output.location.file;
        let Region::Range(loaded) = &output.location.region else {
            actual.rewind()?;
            return crate::bless::bless(path, &Region::EntireFile, actual.as_file_mut())
                .map_err(Error::new);
        };

        let mut edits = self.edits.lock().unwrap_or_else(|e| e.into_inner());
        let file_edits = edits.entry(path.clone()).or_default();
        let shift: i64 = file_edits
            .iter()
            .filter(|edit| edit.end <= loaded.start)
            .map(|edit| edit.delta)
            .sum();
        let current = match (
            loaded.start.checked_add_signed(shift),
            loaded.end.checked_add_signed(shift),
        ) {
            (Some(start), Some(end)) => start..end,
            _ => return Err(stale(output)),
        };

        let mut file = std::fs::File::open(path)?;
        let mut bytes = vec![0; (current.end - current.start) as usize];
        file.seek(SeekFrom::Start(current.start))?;
        if file.read_exact(&mut bytes).is_err() || bytes != output.payload {
            return Err(stale(output));
        }

        let new_len = actual.as_file().metadata()?.len();
        actual.rewind()?;
        crate::bless::bless(path, &Region::Range(current.clone()), actual.as_file_mut())
            .map_err(Error::new)?;
        file_edits.push(Edit {
            end: loaded.end,
            delta: new_len as i64 - (current.end - current.start) as i64,
        });
        Ok(())
    }
}

fn stale(output: &ContentItem) -> Error {
    Error::new(format!(
        "{} changed since it was loaded; re-run to bless it",
        output.location
    ))
}

/// Fenced content always ends a line so the closing fence stays on its own
fn terminate_line(file: &mut std::fs::File) -> std::io::Result<()> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(());
    }
    let mut last = [0; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.seek(SeekFrom::End(0))?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn keep_actual(actual: tempfile::NamedTempFile, log: &mut String, palette: Palette) {
    match actual.keep() {
        Ok((_, path)) => {
            let _ = writeln!(
                log,
                "{}",
                palette.hint(format_args!("Actual output kept at {}", path.display()))
            );
        }
        Err(err) => {
            let _ = writeln!(
                log,
                "{}",
                palette.hint(format_args!("Failed to keep actual output: {err}"))
            );
        }
    }
}

fn write_payload(log: &mut String, payload: &[u8]) {
    let text = String::from_utf8_lossy(payload);
    log.push_str(&text);
    if !text.is_empty() && !text.ends_with('\n') {
        log.push('\n');
    }
}
