//! Background job tracking.
//!
//! The `JobRegistry` owns every background process the shell has started and
//! not yet reaped. Reaping is polled, never signal driven: the shell calls
//! `JobRegistry::reap` once per loop iteration before asking for the next
//! line, so a completion is reported at most one iteration late.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::util;

/// Identifies a job by the order in which it was registered.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A background process under tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    id: JobId,
    pid: Pid,
    name: String,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The command name the job was started with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}\t{}", self.id, self.pid, self.name)
    }
}

/// A job that has been removed from the registry because its process exited.
///
/// Its `Display` implementation is the completion notice written to the
/// diagnostic stream.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedJob {
    pub job: Job,
    /// Exit code, or 128 + signal number if the process was killed by a signal.
    pub status: i32,
}

impl fmt::Display for CompletedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} ({}) completed with status {}]",
            self.job.name, self.job.pid, self.status
        )
    }
}

/// Result of one non-blocking check for an exited child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Poll {
    /// A child terminated with the given status.
    Exited(Pid, i32),
    /// Children exist but none has exited.
    NothingReady,
    /// There are no children left to wait for.
    NoChildren,
}

/// Source of child exit notifications for the reaper.
pub trait WaitAny {
    fn poll(&mut self) -> nix::Result<Poll>;
}

/// Asks the kernel about any child of this process with `waitpid(-1, WNOHANG)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemWaiter;

impl WaitAny for SystemWaiter {
    fn poll(&mut self) -> nix::Result<Poll> {
        let wait_any_child = Pid::from_raw(-1);
        loop {
            match wait::waitpid(wait_any_child, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => return Ok(Poll::NothingReady),
                Ok(wait_status) => match util::termination_status(wait_status) {
                    Some((pid, status)) => return Ok(Poll::Exited(pid, status)),
                    None => {
                        // Stopped or continued children are not completions.
                        debug!("ignoring wait status {:?}", wait_status);
                        continue;
                    }
                },
                Err(Errno::ECHILD) => return Ok(Poll::NoChildren),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// The set of running background jobs, keyed by process id.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<Pid, Job>,
    job_count: u32,
}

impl JobRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Starts tracking `pid`.
    ///
    /// A live pid is unique, so finding `pid` already present means the old
    /// entry is stale; it is replaced.
    pub fn insert<S: Into<String>>(&mut self, pid: Pid, name: S) -> JobId {
        self.job_count += 1;
        let job = Job {
            id: JobId(self.job_count),
            pid,
            name: name.into(),
        };
        info!("tracking background job {}", job);
        if let Some(stale) = self.jobs.insert(pid, job) {
            warn!("replaced stale job {} with the same pid", stale);
        }
        JobId(self.job_count)
    }

    /// Stops tracking `pid`, returning the completed job.
    ///
    /// Returns `None` if no job has that pid, e.g. the exited process was not
    /// a background job.
    pub fn remove(&mut self, pid: Pid, status: i32) -> Option<CompletedJob> {
        let job = self.jobs.remove(&pid)?;
        Some(CompletedJob { job, status })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.jobs.contains_key(&pid)
    }

    /// Jobs from most to least recently started.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by(|a, b| b.id.cmp(&a.id));
        jobs.into_iter()
    }

    /// Removes every job whose process has exited, writing a completion
    /// notice for each to `notices`. Never blocks.
    ///
    /// When no jobs are tracked, returns without consulting `waiter`.
    pub fn reap<W: WaitAny + ?Sized>(
        &mut self,
        waiter: &mut W,
        notices: &mut dyn Write,
    ) -> Vec<CompletedJob> {
        let mut completed = Vec::new();
        if self.is_empty() {
            return completed;
        }

        loop {
            match waiter.poll() {
                Ok(Poll::Exited(pid, status)) => {
                    debug!("{} exited with {}", pid, status);
                    match self.remove(pid, status) {
                        Some(done) => {
                            let temp_result = writeln!(notices, "{}", done);
                            log_if_err!(temp_result, "failed to report {}", done);
                            completed.push(done);
                        }
                        None => debug!("{} is not a background job", pid),
                    }
                }
                Ok(Poll::NothingReady) | Ok(Poll::NoChildren) => break,
                Err(e) => {
                    warn!("waiting for background jobs failed: {}", e);
                    break;
                }
            }
        }

        completed
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tjob_count: {}", self.jobs.len(), self.job_count)?;
        for job in self.iter() {
            writeln!(f, "{}", job)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    /// Replays a fixed sequence of poll results.
    struct ScriptedWaiter {
        polls: VecDeque<nix::Result<Poll>>,
        calls: usize,
    }

    impl ScriptedWaiter {
        fn new(polls: Vec<nix::Result<Poll>>) -> Self {
            ScriptedWaiter {
                polls: polls.into(),
                calls: 0,
            }
        }
    }

    impl WaitAny for ScriptedWaiter {
        fn poll(&mut self) -> nix::Result<Poll> {
            self.calls += 1;
            self.polls.pop_front().unwrap_or(Ok(Poll::NothingReady))
        }
    }

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn insert_and_remove() {
        let mut jobs = JobRegistry::new();
        assert!(jobs.is_empty());

        jobs.insert(pid(100), "sleep");
        jobs.insert(pid(101), "yes");
        assert_eq!(jobs.len(), 2);
        assert!(jobs.contains(pid(100)));

        let done = jobs.remove(pid(100), 0).unwrap();
        assert_eq!(done.job.name(), "sleep");
        assert_eq!(done.job.pid(), pid(100));
        assert_eq!(jobs.len(), 1);
        assert!(!jobs.contains(pid(100)));
    }

    #[test]
    fn remove_unknown_pid_is_noop() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(100), "sleep");
        assert!(jobs.remove(pid(999), 0).is_none());
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn same_pid_is_tracked_once() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(100), "sleep");
        jobs.insert(pid(100), "true");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs.iter().next().unwrap().name(), "true");
    }

    #[test]
    fn iterates_newest_first() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(100), "first");
        jobs.insert(pid(50), "second");
        jobs.insert(pid(200), "third");
        let names: Vec<&str> = jobs.iter().map(Job::name).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn completion_notice() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(1234), "sleep");
        let done = jobs.remove(pid(1234), 0).unwrap();
        assert_eq!(done.to_string(), "[sleep (1234) completed with status 0]");
    }

    #[test]
    fn reap_empty_registry_skips_wait() {
        let mut jobs = JobRegistry::new();
        let mut waiter = ScriptedWaiter::new(vec![Ok(Poll::Exited(pid(1), 0))]);
        let mut notices = Vec::new();
        assert!(jobs.reap(&mut waiter, &mut notices).is_empty());
        assert_eq!(waiter.calls, 0);
        assert!(notices.is_empty());
    }

    #[test]
    fn reap_removes_every_exited_job() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(10), "a");
        jobs.insert(pid(11), "b");
        jobs.insert(pid(12), "c");

        let mut waiter = ScriptedWaiter::new(vec![
            Ok(Poll::Exited(pid(11), 0)),
            Ok(Poll::Exited(pid(10), 2)),
            Ok(Poll::NothingReady),
            Ok(Poll::Exited(pid(12), 0)),
        ]);
        let mut notices = Vec::new();
        let completed = jobs.reap(&mut waiter, &mut notices);

        assert_eq!(completed.len(), 2);
        assert_eq!(jobs.len(), 1);
        assert!(jobs.contains(pid(12)));
        assert_eq!(
            String::from_utf8(notices).unwrap(),
            "[b (11) completed with status 0]\n[a (10) completed with status 2]\n"
        );
        assert_eq!(waiter.calls, 3);
    }

    #[test]
    fn reap_ignores_unknown_children() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(10), "a");

        let mut waiter = ScriptedWaiter::new(vec![
            Ok(Poll::Exited(pid(77), 0)),
            Ok(Poll::NoChildren),
        ]);
        let mut notices = Vec::new();
        assert!(jobs.reap(&mut waiter, &mut notices).is_empty());
        assert_eq!(jobs.len(), 1);
        assert!(notices.is_empty());
    }

    #[test]
    fn reap_stops_on_error() {
        let mut jobs = JobRegistry::new();
        jobs.insert(pid(10), "a");

        let mut waiter = ScriptedWaiter::new(vec![
            Err(Errno::EINVAL),
            Ok(Poll::Exited(pid(10), 0)),
        ]);
        let mut notices = Vec::new();
        assert!(jobs.reap(&mut waiter, &mut notices).is_empty());
        assert_eq!(waiter.calls, 1);
        assert_eq!(jobs.len(), 1);
    }
}
