//! Line sources for the interpreter loop.
//!
//! Interactive sessions read through a `rustyline` editor; scripts and piped
//! input read through a plain buffered reader. Both report end of input the
//! same way, as `Ok(None)`.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use failure::{Fail, ResultExt};
use log::debug;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::errors::{Error, ErrorKind, Result};
use crate::shell::{ShellConfig, PROMPT};
use crate::util;

/// Supplies the interpreter with one line of input at a time.
pub trait LineSource {
    /// Returns the next line without its trailing newline, or `None` at end
    /// of input.
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Reads lines from a terminal with line editing and an in-memory history.
pub struct Editor {
    internal: DefaultEditor,
    prompt: String,
}

impl Editor {
    pub fn new<S: Into<String>>(prompt: S) -> Result<Editor> {
        let internal = DefaultEditor::new().context(ErrorKind::Readline)?;
        Ok(Editor {
            internal,
            prompt: prompt.into(),
        })
    }

    pub fn readline(&mut self) -> Result<Option<String>> {
        match self.internal.readline(&self.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let temp_result = self.internal.add_history_entry(line.as_str());
                    log_if_err!(temp_result, "failed to add history entry");
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => {
                debug!("readline interrupted");
                Ok(Some(String::new()))
            }
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }
}

impl LineSource for Editor {
    fn next_line(&mut self) -> Result<Option<String>> {
        self.readline()
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor {{ prompt: {:?} }}", self.prompt)
    }
}

/// Reads lines from a script file or a pipe.
#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
}

impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Reader { inner }
    }
}

impl Reader<BufReader<File>> {
    /// Opens a script file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::script(path.to_string_lossy(), util::describe_io_error(&e)))?;
        Ok(Reader::new(BufReader::new(file)))
    }
}

/// Reads standard input through the line editor when `config` is
/// interactive, otherwise line by line without a prompt.
pub fn from_stdin(config: &ShellConfig) -> Result<Box<dyn LineSource>> {
    if config.interactive {
        Ok(Box::new(Editor::new(PROMPT)?))
    } else {
        Ok(Box::new(Reader::new(BufReader::new(io::stdin()))))
    }
}

impl<R: BufRead> LineSource for Reader<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut buffer = Vec::new();
        let n = self
            .inner
            .read_until(b'\n', &mut buffer)
            .context(ErrorKind::Io)?;
        if n == 0 {
            return Ok(None);
        }

        if buffer.last() == Some(&b'\n') {
            buffer.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
    }
}
