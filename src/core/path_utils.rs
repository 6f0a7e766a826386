/*
 * Locates the per-user directories the workbench writes to (configuration and
 * the log file) and ensures they exist. Also lists the files a run left in an
 * output folder.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const LOG_FILENAME: &str = "workbench.log";

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. Returns `None` if the platform offers no suitable
 * location or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config local dir for '{app_name}'");
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!("PathUtils: Failed to create config directory {config_path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_path:?}");
    }
    Some(config_path.to_path_buf())
}

pub fn get_log_file_path(app_name: &str) -> Option<PathBuf> {
    get_base_app_config_local_dir(app_name).map(|dir| dir.join(LOG_FILENAME))
}

/*
 * Lists every regular file below `dir`, sorted. A missing directory yields an
 * empty list; unreadable entries are skipped with a warning.
 */
pub fn list_files_recursive(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("PathUtils: Skipping unreadable entry under {dir:?}: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
