// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface.
//!
//! Argument parsing, console messages, and the `count` command.

/// CLI arguments.
pub mod args;

/// The `count` command.
pub mod count;

/// Console message macros and verbosity flag.
pub mod logging;
