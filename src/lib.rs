//! Sqysh - a small shell with background jobs
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unused_import_braces
)]

#[macro_use]
mod util;

mod builtins;
pub mod editor;
pub mod errors;
pub mod execute_command;
pub mod job_control;
pub mod parse;
pub mod shell;

pub use crate::shell::{Flow, Shell, ShellConfig};
pub use crate::util::isatty;
