//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn argument<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Argument(message.as_ref().to_string()))
    }

    pub(crate) fn directory_change<T: AsRef<str>, U: AsRef<str>>(path: T, reason: U) -> Error {
        Error::from(ErrorKind::DirectoryChange {
            path: path.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        })
    }

    pub(crate) fn redirection<T: AsRef<str>, U: AsRef<str>>(path: T, reason: U) -> Error {
        Error::from(ErrorKind::Redirection {
            path: path.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        })
    }

    pub(crate) fn exec<T: AsRef<str>, U: AsRef<str>>(program: T, reason: U) -> Error {
        Error::from(ErrorKind::Exec {
            program: program.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        })
    }

    /// A script file given on the command line could not be read.
    pub(crate) fn script<T: AsRef<str>, U: AsRef<str>>(path: T, reason: U) -> Error {
        Error::from(ErrorKind::Script {
            path: path.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        })
    }

    pub(crate) fn spawn<T: AsRef<str>>(reason: T) -> Error {
        Error::from(ErrorKind::Spawn(reason.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Misused builtin or malformed command line (e.g. `> out` with no command).
    Argument(String),
    DirectoryChange { path: String, reason: String },
    Redirection { path: String, reason: String },
    /// The program could not be located or invoked.
    Exec { program: String, reason: String },
    /// Process creation failed for a reason other than the program itself.
    Spawn(String),
    Script { path: String, reason: String },
    Io,
    Logger,
    Nix,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::Argument(ref message) => write!(f, "{}", message),
            ErrorKind::DirectoryChange {
                ref path,
                ref reason,
            } => write!(f, "cd: {}: {}", path, reason),
            ErrorKind::Redirection {
                ref path,
                ref reason,
            } => write!(f, "{}: {}", path, reason),
            ErrorKind::Exec {
                ref program,
                ref reason,
            } => write!(f, "{}: {}", program, reason),
            ErrorKind::Spawn(ref reason) => write!(f, "unable to create process: {}", reason),
            ErrorKind::Script {
                ref path,
                ref reason,
            } => write!(f, "{}: {}", path, reason),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Logger => write!(f, "unable to initialize logger"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
