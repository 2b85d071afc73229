//! Sqysh Tokenizer
//!
//! Input lines are split on whitespace only: there is no quoting, escaping,
//! or globbing.

use std::ops::Deref;
use std::slice;

/// Characters that separate tokens.
const TOKEN_DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];

/// Splits `line` into its non-empty, whitespace-separated tokens.
///
/// # Examples
///
/// ```
/// use sqysh_rs::parse::tokenize;
///
/// assert_eq!(tokenize("ls -la foo"), vec!["ls", "-la", "foo"]);
/// assert!(tokenize(" \t\r\n").is_empty());
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    line.split(TOKEN_DELIMITERS)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// The tokens of one command invocation.
///
/// The end of the vector marks "no more arguments"; an empty `Argv` is a
/// no-op command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Argv {
    tokens: Vec<String>,
}

impl Argv {
    /// Tokenizes a raw input line.
    pub fn parse(line: &str) -> Argv {
        Argv {
            tokens: tokenize(line),
        }
    }

    /// The command name, or `None` for an empty line.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Every token after the command name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }
}

impl Deref for Argv {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.tokens
    }
}

impl<'a> IntoIterator for &'a Argv {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
