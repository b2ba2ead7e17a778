//! Discovering external programs on the host.

use std::path::{Path, PathBuf};

use crate::core::error::{ExecutorError, ExecutorResult};

/// Finds `program` the way a shell would.
///
/// A name containing a path separator is checked as given; a bare name is
/// searched for across every `PATH` entry. Only existing regular files
/// count, and on unix the file must carry an execute bit. Purely a
/// filesystem scan: nothing is spawned and nothing is mutated.
pub fn which(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

/// Like [`which`], but an absent program becomes
/// [`ExecutorError::EnvironmentNotFound`] carrying `hint` so the caller can
/// tell an operator what to install.
pub fn require(program: &str, hint: &str) -> ExecutorResult<PathBuf> {
    which(program).ok_or_else(|| ExecutorError::EnvironmentNotFound {
        program: program.to_string(),
        hint: hint.to_string(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
