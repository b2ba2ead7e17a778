//! Per-invocation scratch directories.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::core::error::{ExecutorError, ExecutorResult};
use crate::core::OutputFiles;

/// An isolated working directory for one program invocation.
///
/// The directory lives under the caller's root (or the system temp dir) and
/// carries the caller's label plus a random suffix, so two concurrent
/// invocations can never share one even when they ask for the same name.
/// It is removed when the value drops, on success and failure alike, unless
/// [`keep`](ScratchDir::keep) disarms the cleanup first.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates the directory. `name` labels it for humans; a v4 uuid stands
    /// in when the caller does not care. A label carrying path separators
    /// would land the directory outside `root`, so it is refused.
    pub fn create(root: Option<&Path>, name: Option<&str>) -> ExecutorResult<Self> {
        let label = match name {
            Some(name) => {
                bare_file_name(name)?;
                name.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };
        let prefix = format!("{label}.");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        log::debug!("created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// The directory's absolute path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes each named input file into the directory.
    pub fn write_infiles(&self, infiles: &HashMap<String, String>) -> ExecutorResult<()> {
        for (name, content) in infiles {
            bare_file_name(name)?;
            fs::write(self.dir.path().join(name), content)?;
        }
        Ok(())
    }

    /// Reads the named artifacts back out of the directory.
    ///
    /// A name with no file behind it is logged and omitted from the map;
    /// whether that omission is fatal is the parse phase's call.
    pub fn collect_outfiles(&self, names: &[String]) -> ExecutorResult<OutputFiles> {
        let mut outfiles = OutputFiles::new();
        for name in names {
            bare_file_name(name)?;
            match fs::read_to_string(self.dir.path().join(name)) {
                Ok(content) => {
                    outfiles.insert(name.clone(), content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("expected outfile {name} was not produced");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(outfiles)
    }

    /// Disarms cleanup and hands back the path, for post-mortem debugging.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

// File names and directory labels must resolve inside the scratch root.
fn bare_file_name(name: &str) -> ExecutorResult<()> {
    if name.is_empty() || name == ".." || name.contains(['/', '\\']) {
        return Err(ExecutorError::Input(format!(
            "name {name:?} must not reach outside the scratch directory"
        )));
    }
    Ok(())
}
