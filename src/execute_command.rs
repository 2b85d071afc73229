//! Launches external programs.
//!
//! A command line is first split into an `Invocation`: the program, its
//! arguments, optional `<`/`>` redirection targets, and whether a trailing
//! `&` asked for background execution. Redirection targets are opened by the
//! shell and handed to the spawn call as the child's standard streams, so the
//! child either starts fully redirected or not at all.

use std::fs::{File, OpenOptions};
use std::process::{Child, Command};

use failure::ResultExt;
use log::debug;
use nix::errno::Errno;
use nix::libc;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::errors::{Error, ErrorKind, Result};
use crate::job_control::{JobId, JobRegistry};
use crate::util;

const BACKGROUND_MARKER: &str = "&";
const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";

/// A single external command with its redirections resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invocation {
    /// The program to execute, located through `PATH`.
    pub program: String,
    /// The arguments to the program, redirections removed.
    pub args: Vec<String>,
    /// The file to read stdin from, if one is specified.
    pub stdin: Option<String>,
    /// The file to write stdout to, if one is specified.
    pub stdout: Option<String>,
    /// Run the command in the background, defaults to false.
    pub background: bool,
}

impl Invocation {
    /// Splits the background marker and redirections out of `argv`.
    ///
    /// A redirection operator must follow the command name and be followed
    /// by a path. Each stream may be redirected at most once.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqysh_rs::execute_command::Invocation;
    ///
    /// let invocation = Invocation::parse(&["sort", "<", "in.txt", "-r", "&"]).unwrap();
    /// assert_eq!(invocation.program, "sort");
    /// assert_eq!(invocation.args, vec!["-r"]);
    /// assert_eq!(invocation.stdin, Some("in.txt".to_string()));
    /// assert!(invocation.background);
    /// ```
    pub fn parse<T: AsRef<str>>(argv: &[T]) -> Result<Invocation> {
        let (argv, background) = match argv.split_last() {
            Some((last, rest)) if last.as_ref() == BACKGROUND_MARKER => (rest, true),
            _ => (argv, false),
        };

        let mut program: Option<String> = None;
        let mut invocation = Invocation {
            background,
            ..Default::default()
        };

        let mut tokens = argv.iter().map(AsRef::as_ref);
        while let Some(token) = tokens.next() {
            if !is_redirect(token) {
                match program {
                    Some(_) => invocation.args.push(token.to_string()),
                    None => program = Some(token.to_string()),
                }
                continue;
            }

            if program.is_none() {
                return Err(unexpected_token(token));
            }

            let target = match tokens.next() {
                Some(target) if !is_redirect(target) => target,
                Some(target) => return Err(unexpected_token(target)),
                None => return Err(unexpected_token("newline")),
            };

            let slot = if token == INPUT_REDIRECT {
                &mut invocation.stdin
            } else {
                &mut invocation.stdout
            };
            if slot.is_some() {
                return Err(Error::argument(format!("{}: ambiguous redirect", target)));
            }
            *slot = Some(target.to_string());
        }

        invocation.program = match program {
            Some(program) => program,
            None if background => return Err(unexpected_token(BACKGROUND_MARKER)),
            None => return Err(Error::argument("empty command")),
        };

        Ok(invocation)
    }
}

fn is_redirect(token: &str) -> bool {
    token == INPUT_REDIRECT || token == OUTPUT_REDIRECT
}

fn unexpected_token(token: &str) -> Error {
    Error::argument(format!("syntax error near unexpected token `{}'", token))
}

/// What became of a launched command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// A foreground command terminated with this status.
    Completed(i32),
    /// A foreground command was stopped by a signal.
    Stopped(Pid),
    /// The command is running in the background as a tracked job.
    Background(Pid, JobId),
}

/// Runs a non-builtin command.
///
/// Foreground commands are waited for; background commands are added to
/// `jobs` and left running.
pub fn execute<T: AsRef<str>>(argv: &[T], jobs: &mut JobRegistry) -> Result<Outcome> {
    let invocation = Invocation::parse(argv)?;
    launch(&invocation, jobs)
}

/// Spawns `invocation` and waits for it or registers it as a job.
pub fn launch(invocation: &Invocation, jobs: &mut JobRegistry) -> Result<Outcome> {
    let child = spawn(invocation)?;
    let pid = Pid::from_raw(child.id() as libc::pid_t);
    debug!(
        "spawned {} ({}) in the {}",
        invocation.program,
        pid,
        if invocation.background {
            "background"
        } else {
            "foreground"
        }
    );

    if invocation.background {
        let job_id = jobs.insert(pid, invocation.program.as_str());
        return Ok(Outcome::Background(pid, job_id));
    }

    let wait_status = wait_for_process(pid)?;
    debug!("{} finished waiting: {:?}", pid, wait_status);
    match util::termination_status(wait_status) {
        Some((_, status)) => Ok(Outcome::Completed(status)),
        None => Ok(Outcome::Stopped(pid)),
    }
}

fn spawn(invocation: &Invocation) -> Result<Child> {
    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args);

    if let Some(ref path) = invocation.stdin {
        command.stdin(open_input(path)?);
    }
    if let Some(ref path) = invocation.stdout {
        command.stdout(open_output(path)?);
    }

    command.spawn().map_err(|e| {
        let reason = util::describe_io_error(&e);
        match e.raw_os_error().map(Errno::from_i32) {
            Some(Errno::EAGAIN) | Some(Errno::ENOMEM) | Some(Errno::EMFILE)
            | Some(Errno::ENFILE) => Error::spawn(reason),
            _ => Error::exec(&invocation.program, reason),
        }
    })
}

fn open_input(path: &str) -> Result<File> {
    File::open(path).map_err(|e| Error::redirection(path, util::describe_io_error(&e)))
}

fn open_output(path: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::redirection(path, util::describe_io_error(&e)))
}

/// Blocks until `pid` exits or is stopped.
fn wait_for_process(pid: Pid) -> Result<WaitStatus> {
    loop {
        match wait::waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Err(Errno::EINTR) => continue,
            result => return Ok(result.context(ErrorKind::Nix)?),
        }
    }
}
