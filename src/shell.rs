//! Sqysh - Shell Module
//!
//! The Shell owns the background job registry and runs the read, dispatch,
//! and reap loop.

use std::fmt;
use std::io::{self, Write};

use log::{debug, error, info};

use crate::builtins;
use crate::editor::LineSource;
use crate::errors::Result;
use crate::execute_command::{self, Outcome};
use crate::job_control::{CompletedJob, JobRegistry, SystemWaiter};
use crate::parse::Argv;

/// Prompt shown before each line in interactive mode.
pub const PROMPT: &str = "sqysh$ ";

/// Whether the interpreter loop should keep running after a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Sqysh Shell
pub struct Shell {
    job_registry: JobRegistry,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell with no background jobs.
    pub fn new(config: ShellConfig) -> Shell {
        info!("sqysh started up");
        Shell {
            job_registry: JobRegistry::new(),
            config,
        }
    }

    /// The policy this shell was started with.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// The background jobs that have not been reaped yet.
    pub fn jobs(&self) -> &JobRegistry {
        &self.job_registry
    }

    /// Runs one command line. Errors are reported on stderr and never stop
    /// the shell; only the `exit` builtin returns `Flow::Exit`.
    pub fn execute_command_string(&mut self, input: &str) -> Flow {
        let argv = Argv::parse(input);
        match self.execute_command(&argv) {
            Ok(flow) => flow,
            Err(e) => {
                debug!("{:?} failed: {}", input, e);
                eprintln!("sqysh: {}", e);
                Flow::Continue
            }
        }
    }

    fn execute_command(&mut self, argv: &Argv) -> Result<Flow> {
        let program = match argv.program() {
            Some(program) => program,
            None => return Ok(Flow::Continue),
        };

        if builtins::is_builtin(program) {
            return builtins::run(program, argv.args());
        }

        match execute_command::execute(&argv[..], &mut self.job_registry)? {
            Outcome::Completed(status) => debug!("{} completed with status {}", program, status),
            Outcome::Stopped(pid) => info!("{} ({}) stopped", program, pid),
            Outcome::Background(pid, job_id) => {
                debug!("{} ({}) is background job {}", program, pid, job_id)
            }
        }
        Ok(Flow::Continue)
    }

    /// Removes finished background jobs, reporting each on stderr.
    pub fn reap_jobs(&mut self) -> Vec<CompletedJob> {
        let stderr = io::stderr();
        let mut notices = stderr.lock();
        let completed = self.job_registry.reap(&mut SystemWaiter, &mut notices);
        let temp_result = notices.flush();
        log_if_err!(temp_result, "failed to flush completion notices");
        completed
    }

    /// Runs commands from `source` until end of input or `exit`.
    pub fn run(&mut self, source: &mut dyn LineSource) {
        loop {
            self.reap_jobs();

            let input = match source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("next_line: {}", e);
                    eprintln!("sqysh: {}", e);
                    break;
                }
            };

            if self.execute_command_string(&input) == Flow::Exit {
                break;
            }
        }
    }

    /// Announces shutdown. Background jobs are left running.
    pub fn shutdown(&self) {
        if self.config.display_messages {
            println!("exit");
        }

        if !self.job_registry.is_empty() {
            info!("leaving {} background jobs running", self.job_registry.len());
        }
        info!("sqysh has shut down");
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.job_registry)
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShellConfig {
    /// Determines if input is read through the line editor with a prompt.
    pub interactive: bool,

    /// Determines if some messages (e.g. "exit") should be displayed.
    pub display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. a prompt and line editing
    ///
    /// # Complete List
    /// - Lines are read with the line editor and the `sqysh$ ` prompt
    /// - Some additional messages are displayed
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell, e.g. for scripts or piped input
    ///
    /// # Complete List
    /// - No prompt is displayed and lines are read without editing.
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            display_messages: false,
        }
    }
}
