//! Builds and launches SublerCLI invocations.
//!
//! ```no_run
//! use subler_tag_core::{Atoms, MediaKind, Subler};
//!
//! let atoms = Atoms::new().artist("Jane Doe").name("Pilot");
//! let command = Subler::new("episode.mp4", atoms)
//!     .media_kind(MediaKind::TvShow)
//!     .optimize(false)
//!     .build_command()?;
//! println!("{command}");
//! # Ok::<(), subler_tag_core::SublerError>(())
//! ```

pub mod atoms;
pub mod command;
pub mod destination;
pub mod error;
pub mod escape;
pub mod tag;

pub use atoms::{Atom, Atoms, METADATA_FLAG};
pub use command::{
    executable_path_from, resolve_executable_path, CommandFlags, RunOutput, Subler,
    SublerCommand, DEFAULT_EXECUTABLE, EXECUTABLE_ENV_VAR,
};
pub use destination::resolve_destination;
pub use error::{ExitCode, SublerError, SublerResult};
pub use tag::{MediaKind, ParseMediaKindError, Tag};
