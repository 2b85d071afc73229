use std::env;
use std::ffi::OsString;

use log::debug;
use nix::unistd;

use crate::builtins::{self, prelude::*};

pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    fn run<T: AsRef<str>>(args: &[T]) -> Result<Flow> {
        if args.len() > 1 {
            return Err(Error::argument("cd: too many arguments"));
        }

        let dir = match args.first() {
            Some(dir) => OsString::from(dir.as_ref()),
            None => env::var_os("HOME").ok_or_else(|| Error::argument("cd: HOME not set"))?,
        };

        debug!("changing directory to {:?}", dir);
        unistd::chdir(dir.as_os_str())
            .map_err(|e| Error::directory_change(dir.to_string_lossy(), e.desc()))?;
        Ok(Flow::Continue)
    }
}
