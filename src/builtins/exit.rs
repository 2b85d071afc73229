use crate::builtins::{self, prelude::*};

pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    fn run<T: AsRef<str>>(_args: &[T]) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}
