use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use serde::Serialize;
use tracing::{debug, info};

use crate::atoms::{Atom, Atoms};
use crate::destination::resolve_destination;
use crate::error::{SublerError, SublerResult};
use crate::escape::escape_path;
use crate::tag::{MediaKind, Tag};

pub const EXECUTABLE_ENV_VAR: &str = "SUBLER_CLI_PATH";
pub const DEFAULT_EXECUTABLE: &str = "/usr/local/bin/SublerCLI";

const SHELL: &str = "/bin/sh";

/// Executable named by `SUBLER_CLI_PATH`, or the default install location.
pub fn resolve_executable_path() -> PathBuf {
    executable_path_from(|key| env::var_os(key))
}

/// Same as [`resolve_executable_path`] with an injectable variable lookup.
/// An empty value counts as unset.
pub fn executable_path_from<F>(lookup: F) -> PathBuf
where
    F: FnOnce(&str) -> Option<OsString>,
{
    lookup(EXECUTABLE_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE))
}

/// Optional SublerCLI switches. All enabled by default; disabled switches are
/// omitted from the command rather than negated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommandFlags {
    pub chapters_preview: bool,
    pub optimize: bool,
    pub organize_groups: bool,
    pub chunk_64bit: bool,
}

impl Default for CommandFlags {
    fn default() -> Self {
        Self {
            chapters_preview: true,
            optimize: true,
            organize_groups: true,
            chunk_64bit: true,
        }
    }
}

impl CommandFlags {
    /// Enabled switches in wire order.
    pub fn switches(&self) -> Vec<&'static str> {
        [
            (self.chapters_preview, "-chapterspreview"),
            (self.optimize, "-optimize"),
            (self.organize_groups, "-organizegroups"),
            (self.chunk_64bit, "-64bitchunk"),
        ]
        .into_iter()
        .filter_map(|(enabled, switch)| enabled.then_some(switch))
        .collect()
    }
}

/// Executable plus the argument list for one tagging run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SublerCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

impl SublerCommand {
    /// Executable and arguments joined by single spaces, ready for `sh -c`.
    /// Arguments are already escaped, so no further quoting is applied.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for SublerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a blocking run that exited successfully.
#[derive(Debug)]
pub struct RunOutput {
    pub command: SublerCommand,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Builder for a single SublerCLI invocation.
///
/// Setters consume and return the builder. Building never mutates the
/// configured atoms, so `build_command` can be called repeatedly.
#[derive(Clone, Debug)]
pub struct Subler {
    source: PathBuf,
    dest: Option<PathBuf>,
    atoms: Atoms,
    flags: CommandFlags,
    media_kind: Option<MediaKind>,
    executable: Option<PathBuf>,
}

impl Subler {
    pub fn new(source: impl Into<PathBuf>, atoms: Atoms) -> Self {
        Self {
            source: source.into(),
            dest: None,
            atoms,
            flags: CommandFlags::default(),
            media_kind: Some(MediaKind::default()),
            executable: None,
        }
    }

    pub fn dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn optimize(mut self, enabled: bool) -> Self {
        self.flags.optimize = enabled;
        self
    }

    pub fn chapters_preview(mut self, enabled: bool) -> Self {
        self.flags.chapters_preview = enabled;
        self
    }

    pub fn organize_groups(mut self, enabled: bool) -> Self {
        self.flags.organize_groups = enabled;
        self
    }

    pub fn chunk_64bit(mut self, enabled: bool) -> Self {
        self.flags.chunk_64bit = enabled;
        self
    }

    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the media kind; pass `None` to emit no `Media Kind` atom.
    pub fn media_kind(mut self, kind: impl Into<Option<MediaKind>>) -> Self {
        self.media_kind = kind.into();
        self
    }

    pub fn clear_media_kind(self) -> Self {
        self.media_kind(None::<MediaKind>)
    }

    /// Uses `path` instead of the environment/default lookup.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn dest_path(&self) -> Option<&Path> {
        self.dest.as_deref()
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn command_flags(&self) -> CommandFlags {
        self.flags
    }

    pub fn kind(&self) -> Option<MediaKind> {
        self.media_kind
    }

    /// Explicit executable when set, otherwise [`resolve_executable_path`].
    pub fn executable_path(&self) -> PathBuf {
        self.executable
            .clone()
            .unwrap_or_else(resolve_executable_path)
    }

    /// Configured atoms followed by the synthetic `Media Kind` atom, if any.
    pub fn metadata(&self) -> Atoms {
        let mut atoms = self.atoms.clone();
        if let Some(kind) = self.media_kind {
            atoms.push(Atom::new(Tag::MediaKind, kind));
        }
        atoms
    }

    pub fn build_command(&self) -> SublerResult<SublerCommand> {
        if !self.source.is_file() {
            return Err(SublerError::SourceNotFound(self.source.clone()));
        }

        let dest = resolve_destination(&self.source, self.dest.as_deref(), Path::exists)
            .ok_or_else(|| {
                SublerError::DestinationNotFound(
                    self.dest.clone().unwrap_or_else(|| self.source.clone()),
                )
            })?;

        let mut args = vec![
            "-source".to_string(),
            escape_path(&self.source),
            "-dest".to_string(),
            escape_path(&dest),
        ];
        args.extend(self.metadata().render());
        args.extend(self.flags.switches().into_iter().map(String::from));

        let command = SublerCommand {
            executable: self.executable_path(),
            args,
        };
        debug!(command = %command, "built tagging command");
        Ok(command)
    }

    /// Launches the command through the shell and returns immediately with
    /// stdout and stderr piped. The caller owns waiting on the child.
    pub fn spawn(&self) -> SublerResult<Child> {
        let command = self.build_command()?;
        info!(command = %command, "spawning tagging tool");
        let child = shell(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        Ok(child)
    }

    /// Runs the command to completion. A non-zero exit is returned as
    /// [`SublerError::ExternalProcess`] carrying the captured output.
    pub fn run(&self) -> SublerResult<RunOutput> {
        let command = self.build_command()?;
        info!(command = %command, "running tagging tool");
        let output = shell(&command).stdin(Stdio::null()).output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        info!(status = ?output.status.code(), "tagging tool exited");

        if !output.status.success() {
            return Err(SublerError::ExternalProcess {
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(RunOutput {
            command,
            status: output.status,
            stdout,
            stderr,
        })
    }
}

fn shell(command: &SublerCommand) -> Command {
    let mut process = Command::new(SHELL);
    process.arg("-c").arg(command.command_line());
    process
}
