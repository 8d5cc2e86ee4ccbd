//! # Golden-file testing toolbox
//!
//! `goldbox` discovers fixtures on disk, pairs inputs with their expected outputs, and checks
//! freshly generated output against them:
//! - Flat files are classified by name: `greet.input.json` and `greet.output.json` form the
//!   test `greet`
//! - Fenced blocks inside Markdown documents are classified by their header:
//!   ```` ```json gold:input ````
//! - Several inputs or outputs in one group become a matrix of tests
//! - A leading `_` skips a file, block, or whole directory
//!
//! Expectations are compared with a bounded-memory line diff and, when asked to, rewritten
//! ("blessed") in place, including blocks in the middle of a document.
//!
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! fn shout(
//!     input: goldbox::runner::Input<'_>,
//!     _output: goldbox::Metadata<'_>,
//!     actual: &mut dyn Write,
//! ) -> Result<(), goldbox::Error> {
//!     actual.write_all(input.to_str()?.to_uppercase().as_bytes())?;
//!     Ok(())
//! }
//!
//! let tree = goldbox::load::load("tests/fixtures").unwrap();
//! let runner = goldbox::Runner::with_config(
//!     shout,
//!     goldbox::runner::Config::new().action_env(goldbox::DEFAULT_ACTION_ENV),
//! );
//! for report in runner.run(&tree) {
//!     print!("{report}");
//! }
//! ```
//!
//! For `cargo test` integration, see `trygold`.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]

mod action;
mod error;

pub mod bless;
pub mod classify;
pub mod content;
pub mod correlate;
pub mod load;
pub mod report;
pub mod runner;
pub mod streamdiff;
pub mod tree;
pub mod utils;

pub use action::Action;
pub use action::DEFAULT_ACTION_ENV;
pub use content::ContentItem;
pub use content::Metadata;
pub use error::Error;
pub use error::Result;
pub use load::LoadError;
pub use load::Loader;
pub use runner::Runner;
pub use tree::TestNode;
