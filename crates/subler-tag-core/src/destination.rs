//! Output path selection that never lands on an existing file.
//!
//! The existence check and the later write by the tagging tool are not
//! atomic; another process may claim the chosen path in between.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Picks the output path for `source`.
///
/// An explicit destination that does not exist yet is used verbatim. An
/// existing explicit destination, or the source itself when no destination
/// was given, is probed with numbered suffixes (`name.0.mp4`, `name.1.mp4`,
/// ...) until `exists` reports a free path.
pub fn resolve_destination<F>(source: &Path, dest: Option<&Path>, exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let resolved = match dest {
        Some(dest) if !exists(dest) => Some(dest.to_path_buf()),
        Some(dest) => next_available(dest, &exists),
        None => next_available(source, &exists),
    };
    debug!(
        source = %source.display(),
        requested = ?dest,
        resolved = ?resolved,
        "resolved destination"
    );
    resolved
}

fn next_available<F>(path: &Path, exists: &F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    path.file_stem()?;
    (0..=u32::MAX)
        .filter_map(|index| numbered(path, index))
        .find(|candidate| !exists(candidate))
}

/// `dir/stem.N.ext`, or `dir/name.N` when there is no extension. `None` when
/// the path has no file name to number.
pub fn numbered(path: &Path, index: u32) -> Option<PathBuf> {
    let stem = path.file_stem()?;
    let mut name = OsString::from(stem);
    name.push(format!(".{index}"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(path.with_file_name(name))
}
