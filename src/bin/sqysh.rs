use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use failure::ResultExt;
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use sqysh_rs::editor::{self, Reader};
use sqysh_rs::errors::{Error, ErrorKind, Result};
use sqysh_rs::{isatty, Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".sqysh_log";
const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;

const USAGE: &str = "
sqysh.

Usage:
    sqysh [options]
    sqysh [options] -c <command>
    sqysh [options] <file>
    sqysh (-h | --help)
    sqysh --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              If the -c option is present, then commands are read from the first non-option
                        argument command_string.
    --log=<path>    File to write log to, defaults to ~/.sqysh_log
    --verbose       Log at trace level.
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
    flag_verbose: bool,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    // The shell is still usable without a log file.
    if let Err(e) = init_logger(&args) {
        eprintln!("sqysh: {}, continuing without a log file", e);
    }
    debug!("{:?}", args);

    if args.flag_version {
        println!("sqysh version {}", env!("CARGO_PKG_VERSION"));
        process::exit(EXIT_SUCCESS);
    }

    match run(&args) {
        Ok(()) => process::exit(EXIT_SUCCESS),
        Err(e) => {
            error!("sqysh failed: {}", e);
            eprintln!("sqysh: {}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}

fn init_logger(args: &Args) -> Result<()> {
    let log_path = match args.flag_log {
        Some(ref path) => PathBuf::from(path),
        None => dirs::home_dir()
            .map(|home| home.join(LOG_FILE_NAME))
            .ok_or_else(|| Error::from(ErrorKind::Logger))?,
    };
    let level = if args.flag_verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Debug
    };

    let pid = Pid::this();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(log_path).context(ErrorKind::Logger)?)
        .apply()
        .context(ErrorKind::Logger)?;
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    if args.flag_c {
        let command = args.arg_command.as_ref().ok_or_else(|| {
            Error::from(ErrorKind::Argument(
                "-c: option requires an argument".to_string(),
            ))
        })?;
        let mut shell = Shell::new(ShellConfig::noninteractive());
        shell.execute_command_string(command);
        shell.shutdown();
        return Ok(());
    }

    if let Some(ref path) = args.arg_file {
        let mut source = Reader::open(path)?;
        let mut shell = Shell::new(ShellConfig::noninteractive());
        shell.run(&mut source);
        shell.shutdown();
        return Ok(());
    }

    let config = if isatty() {
        ShellConfig::interactive()
    } else {
        ShellConfig::noninteractive()
    };
    let mut shell = Shell::new(config);
    let mut source = editor::from_stdin(shell.config())?;
    shell.run(source.as_mut());
    shell.shutdown();
    Ok(())
}
