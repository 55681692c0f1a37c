use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    SourceNotFound = 1,
    DestinationNotFound = 2,
    InvalidArguments = 3,
    Io = 4,
    ExternalProcess = 5,
    Config = 6,
}

#[derive(Debug, Error)]
pub enum SublerError {
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("no usable destination could be resolved for {}", .0.display())]
    DestinationNotFound(PathBuf),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The tagging tool ran but exited unsuccessfully. `code` is `None` when
    /// the process was terminated by a signal.
    #[error("{}", describe_exit(.code))]
    ExternalProcess {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("external process exited with status {code}"),
        None => "external process terminated by signal".to_string(),
    }
}

impl SublerError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::SourceNotFound(_) => ExitCode::SourceNotFound,
            Self::DestinationNotFound(_) => ExitCode::DestinationNotFound,
            Self::InvalidArguments(_) => ExitCode::InvalidArguments,
            Self::Io(_) => ExitCode::Io,
            Self::ExternalProcess { .. } => ExitCode::ExternalProcess,
            Self::Config(_) => ExitCode::Config,
        }
    }
}

pub type SublerResult<T> = Result<T, SublerError>;
