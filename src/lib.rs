//! [`Harness`] for golden-file tests discovered on disk
//!
//! This is a custom test harness and should be put in its own test binary with
//! [`test.harness = false`](https://doc.rust-lang.org/stable/cargo/reference/cargo-targets.html#the-harness-field).
//!
//! Every assertion found under the root becomes one test, named by its path in the test tree.
//! Control runs through environment variables:
//! - `GOLDEN=overwrite` (or `bless`) rewrites expectations that do not match
//! - `GOLDEN=skip` / `GOLDEN=ignore` skip every test
//! - `GOLDEN_LANG=json` only runs assertions with JSON input or output
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! fn main() {
//!     trygold::Harness::new("tests/fixtures", pretty).test();
//! }
//!
//! fn pretty(
//!     input: trygold::Input<'_>,
//!     _output: trygold::Metadata<'_>,
//!     actual: &mut dyn Write,
//! ) -> Result<(), trygold::Error> {
//!     let value: serde_json::Value =
//!         serde_json::from_slice(input.bytes()).map_err(trygold::Error::new)?;
//!     let pretty = serde_json::to_string_pretty(&value).map_err(trygold::Error::new)?;
//!     writeln!(actual, "{pretty}")?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use libtest_mimic::Trial;

#[cfg(feature = "color")]
use anstream::eprint;
#[cfg(not(feature = "color"))]
use std::eprint;

pub use goldbox::runner::Generator;
pub use goldbox::runner::Input;
pub use goldbox::Action;
pub use goldbox::Error;
pub use goldbox::Loader;
pub use goldbox::Metadata;

use goldbox::runner::Config;
use goldbox::runner::Outcome;
use goldbox::runner::Runner;

/// Environment variable read for the language filter
pub const DEFAULT_LANG_ENV: &str = "GOLDEN_LANG";

/// [`Harness`] for golden-file tests discovered on disk
pub struct Harness<G> {
    root: std::path::PathBuf,
    overrides: Option<ignore::overrides::Override>,
    loader: Loader,
    generator: G,
    config: Config,
}

impl<G> Harness<G>
where
    G: Generator + Send + Sync + 'static,
{
    /// Specify where the fixtures live
    ///
    /// - `root`: directory (or single document) to load.  See [`Self::select`] for restricting
    ///   what files are considered
    /// - `generator`: given an input, write the actual output
    pub fn new(root: impl Into<std::path::PathBuf>, generator: G) -> Self {
        let language = std::env::var(DEFAULT_LANG_ENV).ok();
        Self {
            root: root.into(),
            overrides: None,
            loader: Loader::new(),
            generator,
            config: Config::new()
                .action_env(goldbox::DEFAULT_ACTION_ENV)
                .language(language),
        }
    }

    /// Path patterns for selecting fixture files
    ///
    /// This uses gitignore syntax.  Directories are always descended into.
    pub fn select<'p>(mut self, patterns: impl IntoIterator<Item = &'p str>) -> Self {
        let mut overrides = ignore::overrides::OverrideBuilder::new(&self.root);
        for line in patterns {
            overrides.add(line).unwrap();
        }
        self.overrides = Some(overrides.build().unwrap());
        self
    }

    /// Read the failure action from an environment variable
    pub fn action_env(mut self, var_name: &str) -> Self {
        self.config = self.config.action_env(var_name);
        self
    }

    /// Override the failure action
    pub fn action(mut self, action: Action) -> Self {
        self.config = self.config.action(action);
        self
    }

    /// Read the language filter from an environment variable
    pub fn language_env(mut self, var_name: &str) -> Self {
        self.config = self.config.language(std::env::var(var_name).ok());
        self
    }

    /// Only run assertions where the input or output has `language`
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config = self.config.language(Some(language.into()));
        self
    }

    /// Customize how fixtures are discovered
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    /// Customize the assertion behavior
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Run tests
    pub fn test(self) -> ! {
        let tests = self.trials();
        let mut args = libtest_mimic::Arguments::from_args();
        // Blessing rewrites shared files in place
        args.test_threads = Some(1);
        libtest_mimic::run(&args, tests).exit()
    }

    /// Load the fixtures into one [`Trial`] per assertion, without running them
    ///
    /// A fixture that fails to load becomes a single failing trial named after the root.
    pub fn trials(self) -> Vec<Trial> {
        let Self {
            root,
            overrides,
            mut loader,
            generator,
            config,
        } = self;
        if let Some(overrides) = overrides {
            loader = loader.filter(move |path, is_dir| {
                is_dir || overrides.matched(path, is_dir).is_whitelist()
            });
        }

        let tree = match loader.load(&root) {
            Ok(tree) => tree,
            Err(err) => {
                let message = err.to_string();
                return vec![Trial::test(root.display().to_string(), move || {
                    Err(message.into())
                })];
            }
        };

        let action = config.action;
        let action_env = config.action_env.clone();
        let runner = std::sync::Arc::new(Runner::with_config(generator, config));
        tree.cases()
            .into_iter()
            .map(|case| {
                let path = case.path();
                let name = if path.len() > 1 {
                    path[1..].join("/")
                } else {
                    path.join("/")
                };
                let ignored = case.skip
                    || matches!(action, Action::Skip | Action::Ignore)
                    || !runner.config().selects(case.assertion);
                let hint = action_env.as_deref().map(|var| rerun_hint(var, &name));
                let assertion = case.assertion.clone();
                let runner = runner.clone();
                Trial::test(name, move || {
                    let verdict = runner.check(&assertion);
                    match verdict.outcome {
                        Outcome::Fail => {
                            let mut log = verdict.log;
                            if let Some(hint) = hint {
                                log.push_str(&hint);
                            }
                            Err(log.into())
                        }
                        Outcome::Pass | Outcome::Skip => {
                            if verdict.blessed {
                                eprint!("{}", verdict.log);
                            }
                            Ok(())
                        }
                    }
                })
                .with_ignored_flag(ignored)
            })
            .collect()
    }
}

/// Command re-running (and blessing) only the test called `name`
fn rerun_hint(var: &str, name: &str) -> String {
    let quoted = shlex::try_quote(name).unwrap_or(std::borrow::Cow::Borrowed(name));
    format!("Re-run only this test with `{var}=overwrite cargo test -- --exact {quoted}`\n")
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn echo(input: Input<'_>, _: Metadata<'_>, actual: &mut dyn Write) -> Result<(), Error> {
        actual.write_all(input.bytes())?;
        Ok(())
    }

    fn summary(trials: &[Trial]) -> Vec<(&str, bool)> {
        trials
            .iter()
            .map(|t| (t.name(), t.has_ignored_flag()))
            .collect()
    }

    fn run(trials: Vec<Trial>) -> libtest_mimic::Conclusion {
        let args = libtest_mimic::Arguments {
            test_threads: Some(1),
            quiet: true,
            ..Default::default()
        };
        libtest_mimic::run(&args, trials)
    }

    #[test]
    fn one_trial_per_assertion() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.input.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("a.output.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("_b.input.txt"), "b\n").unwrap();
        std::fs::write(root.path().join("_b.output.txt"), "stale\n").unwrap();

        let trials = Harness::new(root.path(), echo)
            .action(Action::Verify)
            .trials();
        assert_eq!(summary(&trials), [("a", false), ("b", true)]);

        let conclusion = run(trials);
        assert_eq!(conclusion.num_passed, 1);
        assert_eq!(conclusion.num_ignored, 1);
        assert_eq!(conclusion.num_failed, 0);
    }

    #[test]
    fn load_error_is_one_failing_trial() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("good.input.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("good.output.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("orphan.output.txt"), "x\n").unwrap();

        let trials = Harness::new(root.path(), echo).trials();
        let root_name = root.path().display().to_string();
        assert_eq!(summary(&trials), [(root_name.as_str(), false)]);

        let conclusion = run(trials);
        assert_eq!(conclusion.num_failed, 1);
    }

    #[test]
    fn language_filter_ignores_trials() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.input.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("a.output.txt"), "a\n").unwrap();
        std::fs::write(root.path().join("b.input.json"), "{}\n").unwrap();
        std::fs::write(root.path().join("b.output.json"), "{}\n").unwrap();

        let trials = Harness::new(root.path(), echo)
            .action(Action::Verify)
            .language("json")
            .trials();
        assert_eq!(summary(&trials), [("a", true), ("b", false)]);
    }

    #[test]
    fn rerun_hint_quotes_name() {
        assert_eq!(
            rerun_hint("GOLDEN", "docs/Pretty printing/anonymous test on line 9"),
            "Re-run only this test with \
             `GOLDEN=overwrite cargo test -- --exact \
             'docs/Pretty printing/anonymous test on line 9'`\n"
        );
        assert_eq!(
            rerun_hint("GOLDEN", "greet"),
            "Re-run only this test with `GOLDEN=overwrite cargo test -- --exact greet`\n"
        );
    }
}
