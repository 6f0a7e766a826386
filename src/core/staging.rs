/*
 * Copies user-selected raw instrument files into an isolated temporary folder
 * before processing, so the pipeline never reads from (or writes next to) the
 * user's originals. Only files whose name ends with the required suffix are
 * staged; everything else is skipped without complaint.
 */
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STAGING_DIR_PREFIX: &str = "tx0_input_";

#[derive(Debug)]
pub enum StagingError {
    Io(io::Error),
    Copy { target_dir: PathBuf, source: io::Error },
}

impl From<io::Error> for StagingError {
    fn from(err: io::Error) -> Self {
        StagingError::Io(err)
    }
}

impl std::fmt::Display for StagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingError::Io(e) => write!(f, "Staging I/O error: {e}"),
            StagingError::Copy { target_dir, source } => {
                write!(f, "Failed to copy input files into {target_dir:?}: {source}")
            }
        }
    }
}

impl std::error::Error for StagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StagingError::Io(e) => Some(e),
            StagingError::Copy { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, StagingError>;

fn has_required_suffix(path: &Path, required_suffix: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(required_suffix))
        .unwrap_or(false)
}

/*
 * Copies each regular file in `files` whose name ends with `required_suffix`
 * into `target_dir`, keeping the file name. A name collision overwrites the
 * earlier copy. Returns the destination paths in input order.
 * Copy failures propagate; nothing is rolled back.
 */
pub fn stage_files(
    files: &[PathBuf],
    target_dir: &Path,
    required_suffix: &str,
) -> io::Result<Vec<PathBuf>> {
    let mut staged = Vec::new();
    for source in files {
        if !source.is_file() {
            log::debug!("Staging: Skipping {source:?}, not a regular file.");
            continue;
        }
        if !has_required_suffix(source, required_suffix) {
            log::debug!("Staging: Skipping {source:?}, name does not end with '{required_suffix}'.");
            continue;
        }
        // is_file() passed, so a file name exists.
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let destination = target_dir.join(file_name);
        fs::copy(source, &destination)?;
        log::trace!("Staging: Copied {source:?} -> {destination:?}");
        if !staged.contains(&destination) {
            staged.push(destination);
        }
    }
    Ok(staged)
}

/*
 * An isolated temporary folder holding copies of the selected input files.
 * The folder lives exactly as long as this value: replacing the selection (or
 * ending the session) deletes it.
 */
#[derive(Debug)]
pub struct StagedInput {
    dir: TempDir,
    selected_files: Vec<PathBuf>,
    staged_files: Vec<PathBuf>,
}

impl StagedInput {
    pub fn create(files: &[PathBuf], required_suffix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir()?;
        Self::create_in(dir, files, required_suffix)
    }

    fn create_in(dir: TempDir, files: &[PathBuf], required_suffix: &str) -> Result<Self> {
        let staged_files =
            stage_files(files, dir.path(), required_suffix).map_err(|source| {
                StagingError::Copy {
                    target_dir: dir.path().to_path_buf(),
                    source,
                }
            })?;
        log::info!(
            "Staging: Staged {} of {} selected file(s) into {:?}.",
            staged_files.len(),
            files.len(),
            dir.path()
        );
        Ok(StagedInput {
            dir,
            selected_files: files.to_vec(),
            staged_files,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected_files
    }

    pub fn staged_files(&self) -> &[PathBuf] {
        &self.staged_files
    }

    pub fn is_empty(&self) -> bool {
        self.staged_files.is_empty()
    }
}
