//! Sqysh builtins
//!
//! Commands implemented inside the shell rather than as external programs.

use self::prelude::*;

use self::dirs::Cd;
use self::exit::Exit;

pub mod prelude {
    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Flow;
}

mod dirs;
mod exit;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";

/// Represents a Sqysh builtin command such as cd or exit.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// Runs the command with the arguments that followed its name.
    fn run<T: AsRef<str>>(args: &[T]) -> Result<Flow>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME].contains(&program.as_ref())
}

/// precondition: `program` is a builtin.
pub fn run<S1, S2>(program: S1, args: &[S2]) -> Result<Flow>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));

    match program.as_ref() {
        CD_NAME => Cd::run(args),
        EXIT_NAME => Exit::run(args),
        _ => unreachable!(),
    }
}
