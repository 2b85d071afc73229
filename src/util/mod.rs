use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::sys::wait::WaitStatus;
use nix::unistd::{self, Pid};

/// Logs the error of a `Result` that the caller has decided not to propagate.
macro_rules! log_if_err {
    ($result:expr, $($arg:tt)+) => {
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($($arg)+), e);
        }
    };
}

/// Offset added to a signal number to form the status of a signaled process,
/// following the POSIX shell convention.
pub const SIGNALED_STATUS_OFFSET: i32 = 128;

pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}

pub fn isatty() -> bool {
    let temp_result = unistd::isatty(get_terminal());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

/// The `strerror` text of an OS error, without Rust's "(os error N)" suffix.
pub fn describe_io_error(e: &io::Error) -> String {
    match e.raw_os_error() {
        Some(code) => Errno::from_i32(code).desc().to_string(),
        None => e.to_string(),
    }
}

/// Returns the pid and integer status of a process that has terminated, or
/// `None` if `wait_status` does not describe a termination.
pub fn termination_status(wait_status: WaitStatus) -> Option<(Pid, i32)> {
    match wait_status {
        WaitStatus::Exited(pid, code) => Some((pid, code)),
        WaitStatus::Signaled(pid, signal, _) => {
            Some((pid, SIGNALED_STATUS_OFFSET + signal as i32))
        }
        _ => None,
    }
}
